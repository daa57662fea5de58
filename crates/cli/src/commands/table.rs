use anyhow::Result;
use serde::Serialize;

use ffi_audit_core::analysis::runtime_ops::{
    AllocatorSymbol, RuntimeOp, NATIVE_MEMORY_OPS, PLATFORM_ALLOCATORS,
};

#[derive(Serialize)]
struct OperationTable {
    native_interface: &'static [RuntimeOp],
    allocators: &'static [AllocatorSymbol],
}

/// Print the memory-management operations the dynamic-memory analysis knows.
pub fn table_command(json: bool) -> Result<()> {
    if json {
        let table =
            OperationTable { native_interface: NATIVE_MEMORY_OPS, allocators: PLATFORM_ALLOCATORS };
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("JNI native interface slots:");
    for op in NATIVE_MEMORY_OPS {
        println!("  {:>3}  {:<32} {:?}", op.slot, op.name, op.effect);
    }
    println!();
    println!("Platform allocators:");
    for a in PLATFORM_ALLOCATORS {
        println!("  {:<8} {:<18} {:?}", a.symbol, a.display, a.effect);
    }
    Ok(())
}
