//! Classification of calls that cross back into the managed runtime.
//!
//! JNI code reaches the JVM through two function tables: the per-thread
//! `JNIEnv` (`struct JNINativeInterface_`) and the process-wide `JavaVM`
//! (`struct JNIInvokeInterface_`). Every call through either table passes the
//! table pointer as its first argument, so the first argument's type signature
//! identifies the call. Matching on the rendered signature keeps the audit
//! independent of the runtime's own headers.

use crate::model::Instruction;

/// Signature fragment of the per-thread native interface table.
pub const NATIVE_INTERFACE_SIG: &str = "%struct.JNINativeInterface_*";

/// Signature fragment of the process-wide invocation interface table.
pub const INVOKE_INTERFACE_SIG: &str = "%struct.JNIInvokeInterface_*";

/// Whether `call` targets the runtime's dispatch interface.
///
/// Non-call instructions and calls without arguments are never boundary calls.
pub fn is_boundary_call(call: &Instruction) -> bool {
    if !call.is_call() {
        return false;
    }
    call.first_arg().map(|arg| is_interface_signature(&arg.ty.signature())).unwrap_or(false)
}

/// Whether a rendered type signature mentions either interface table.
pub fn is_interface_signature(signature: &str) -> bool {
    signature.contains(NATIVE_INTERFACE_SIG) || signature.contains(INVOKE_INTERFACE_SIG)
}
