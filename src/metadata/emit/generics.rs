/// Descriptor for one generic parameter declared by a method.
///
/// Created through
/// [`crate::metadata::emit::MethodDefBuilder::define_generic_parameters`];
/// ordinal positions are assigned in input order at creation and are never
/// reused or reordered afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParamBuilder {
    name: String,
    position: u32,
}

impl GenericParamBuilder {
    pub(crate) fn new(name: &str, position: u32) -> Self {
        GenericParamBuilder {
            name: name.to_string(),
            position,
        }
    }

    /// The declared generic parameter name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 0-based ordinal position within the declaring method
    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }
}
