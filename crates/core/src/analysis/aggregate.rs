use crate::model::Type;

/// Whether `ty` is a pointer that reaches a struct, directly or through more
/// levels of indirection.
///
/// `%struct.S*` and `%struct.S***` qualify; `i8*`, `[4 x i32]*` and
/// `[2 x %struct.S]*` do not, because the first non-pointer pointee is not a
/// struct. Non-pointer input is never an aggregate pointer.
pub fn points_to_aggregate(ty: &Type) -> bool {
    let mut current = ty;
    while let Some(pointee) = current.pointee() {
        if pointee.is_struct() {
            return true;
        }
        current = pointee;
    }
    false
}
