//! Fixed knowledge about memory-management entry points.
//!
//! Two tables live here:
//! - the JNI function-table slots that hand out or take back native memory or
//!   references (indices are fixed by the JNI ABI, counted from the start of
//!   `struct JNINativeInterface_`, reserved slots included);
//! - the platform allocator symbols of C and the Itanium C++ ABI.

use serde::Serialize;

use crate::analysis::boundary::NATIVE_INTERFACE_SIG;
use crate::model::{InstKind, Instruction};

/// Direction of a memory-management operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryEffect {
    Acquire,
    Release,
    Resize,
}

/// Resource family a native-interface slot manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    LocalFrame,
    GlobalRef,
    LocalRef,
    WeakGlobalRef,
    Object,
    StringChars,
    StringUtfChars,
    StringCritical,
    ArrayElements,
    ArrayCritical,
}

/// One memory-management slot of the native interface table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeOp {
    pub slot: u32,
    pub name: &'static str,
    pub resource: ResourceKind,
    pub effect: MemoryEffect,
}

const fn op(
    slot: u32,
    name: &'static str,
    resource: ResourceKind,
    effect: MemoryEffect,
) -> RuntimeOp {
    RuntimeOp { slot, name, resource, effect }
}

use MemoryEffect::{Acquire, Release};
use ResourceKind::*;

/// Memory-management slots of `struct JNINativeInterface_`.
pub const NATIVE_MEMORY_OPS: &[RuntimeOp] = &[
    op(19, "PushLocalFrame", LocalFrame, Acquire),
    op(20, "PopLocalFrame", LocalFrame, Release),
    op(21, "NewGlobalRef", GlobalRef, Acquire),
    op(22, "DeleteGlobalRef", GlobalRef, Release),
    op(23, "DeleteLocalRef", LocalRef, Release),
    op(25, "NewLocalRef", LocalRef, Acquire),
    op(27, "AllocObject", Object, Acquire),
    op(165, "GetStringChars", StringChars, Acquire),
    op(166, "ReleaseStringChars", StringChars, Release),
    op(169, "GetStringUTFChars", StringUtfChars, Acquire),
    op(170, "ReleaseStringUTFChars", StringUtfChars, Release),
    op(183, "GetBooleanArrayElements", ArrayElements, Acquire),
    op(184, "GetByteArrayElements", ArrayElements, Acquire),
    op(185, "GetCharArrayElements", ArrayElements, Acquire),
    op(186, "GetShortArrayElements", ArrayElements, Acquire),
    op(187, "GetIntArrayElements", ArrayElements, Acquire),
    op(188, "GetLongArrayElements", ArrayElements, Acquire),
    op(189, "GetFloatArrayElements", ArrayElements, Acquire),
    op(190, "GetDoubleArrayElements", ArrayElements, Acquire),
    op(191, "ReleaseBooleanArrayElements", ArrayElements, Release),
    op(192, "ReleaseByteArrayElements", ArrayElements, Release),
    op(193, "ReleaseCharArrayElements", ArrayElements, Release),
    op(194, "ReleaseShortArrayElements", ArrayElements, Release),
    op(195, "ReleaseIntArrayElements", ArrayElements, Release),
    op(196, "ReleaseLongArrayElements", ArrayElements, Release),
    op(197, "ReleaseFloatArrayElements", ArrayElements, Release),
    op(198, "ReleaseDoubleArrayElements", ArrayElements, Release),
    op(222, "GetPrimitiveArrayCritical", ArrayCritical, Acquire),
    op(223, "ReleasePrimitiveArrayCritical", ArrayCritical, Release),
    op(224, "GetStringCritical", StringCritical, Acquire),
    op(225, "ReleaseStringCritical", StringCritical, Release),
    op(226, "NewWeakGlobalRef", WeakGlobalRef, Acquire),
    op(227, "DeleteWeakGlobalRef", WeakGlobalRef, Release),
];

/// Look up a native-interface slot.
pub fn native_op(slot: u32) -> Option<&'static RuntimeOp> {
    NATIVE_MEMORY_OPS.iter().find(|op| op.slot == slot)
}

/// Language runtime an allocator symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocatorFamily {
    C,
    Cxx,
}

/// A platform allocation or deallocation symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocatorSymbol {
    pub symbol: &'static str,
    pub display: &'static str,
    pub family: AllocatorFamily,
    pub effect: MemoryEffect,
}

const fn alloc(
    symbol: &'static str,
    display: &'static str,
    family: AllocatorFamily,
    effect: MemoryEffect,
) -> AllocatorSymbol {
    AllocatorSymbol { symbol, display, family, effect }
}

/// C allocators followed by the mangled 64-bit `operator new`/`delete` forms.
pub const PLATFORM_ALLOCATORS: &[AllocatorSymbol] = &[
    alloc("malloc", "malloc", AllocatorFamily::C, Acquire),
    alloc("calloc", "calloc", AllocatorFamily::C, Acquire),
    alloc("realloc", "realloc", AllocatorFamily::C, MemoryEffect::Resize),
    alloc("free", "free", AllocatorFamily::C, Release),
    alloc("_Znwm", "operator new", AllocatorFamily::Cxx, Acquire),
    alloc("_Znam", "operator new[]", AllocatorFamily::Cxx, Acquire),
    alloc("_ZdlPv", "operator delete", AllocatorFamily::Cxx, Release),
    alloc("_ZdaPv", "operator delete[]", AllocatorFamily::Cxx, Release),
];

/// Exact-name lookup of a platform allocator symbol.
pub fn allocator(symbol: &str) -> Option<&'static AllocatorSymbol> {
    PLATFORM_ALLOCATORS.iter().find(|a| a.symbol == symbol)
}

/// Shape of a native-interface slot access, before table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAccess {
    /// Not an address computation on the native interface table.
    NotInterface,
    /// Interface-typed, but the field index is missing or not a usable constant.
    Malformed,
    /// Interface-typed with a constant field index.
    Slot(u32),
}

/// Classify an instruction as a native-interface table access.
///
/// The slot loaded from `JNIEnv` is selected by the second index of the
/// `getelementptr` (`getelementptr %struct.JNINativeInterface_, ... 0, <slot>`).
pub fn slot_access(inst: &Instruction) -> SlotAccess {
    let InstKind::AddressOf { base, indices } = &inst.kind else {
        return SlotAccess::NotInterface;
    };
    if !base.ty.signature().contains(NATIVE_INTERFACE_SIG) {
        return SlotAccess::NotInterface;
    }
    match indices.get(1).and_then(|index| index.as_const_int()) {
        Some(slot) => u32::try_from(slot).map(SlotAccess::Slot).unwrap_or(SlotAccess::Malformed),
        None => SlotAccess::Malformed,
    }
}

/// The memory-management slot an instruction selects, if any.
pub fn native_memory_slot(inst: &Instruction) -> Option<&'static RuntimeOp> {
    match slot_access(inst) {
        SlotAccess::Slot(slot) => native_op(slot),
        _ => None,
    }
}
