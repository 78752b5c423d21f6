/// Arrow schema for the per-sample feature frame.
pub mod features {
    use arrow::datatypes::{DataType, Field, Schema};

    pub const SAMPLE_ID: &str = "sample_id";
    pub const SOURCE: &str = "source";
    pub const TOKEN_COUNT: &str = "token_count";
    pub const HAS_QUESTION: &str = "has_question";
    pub const HAS_TRIGGER: &str = "has_trigger";
    pub const TEXT: &str = "text";

    /// Schema for feature records, one row per sample.
    pub fn feature_schema() -> Schema {
        Schema::new(vec![
            Field::new(SAMPLE_ID, DataType::Utf8, false),
            Field::new(SOURCE, DataType::Utf8, false),
            Field::new(TOKEN_COUNT, DataType::UInt32, false),
            Field::new(HAS_QUESTION, DataType::Boolean, false),
            Field::new(HAS_TRIGGER, DataType::Boolean, false),
            Field::new(TEXT, DataType::Utf8, false),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::features;

    #[test]
    fn feature_schema_has_expected_fields() {
        let schema = features::feature_schema();
        assert_eq!(schema.fields().len(), 6);
        assert!(schema.field_with_name(features::SAMPLE_ID).is_ok());
        assert!(schema.field_with_name(features::TOKEN_COUNT).is_ok());
        assert!(!schema.field_with_name(features::TEXT).unwrap().is_nullable());
    }
}
