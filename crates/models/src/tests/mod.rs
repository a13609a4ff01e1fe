
/// Entity construction, identity and typed conversions
pub mod entity_tests;
