//! Dense ids for module entities

define_id!(
    /// Index of a function in its module
    FunctionId,
    "fn#"
);

define_id!(
    /// Index of a value in its module's value table
    ValueId,
    "v"
);

define_id!(
    /// Index of a call site in its module
    CallSiteId,
    "cs#"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_order() {
        assert_eq!(ValueId(3).to_string(), "v3");
        assert_eq!(FunctionId(0).to_string(), "fn#0");
        assert!(CallSiteId(1) < CallSiteId(2));
        assert_eq!(ValueId::new(7).index(), 7);
    }
}
