#[allow(non_snake_case)]
/// All possible flags for `ParamAttributes`
pub mod ParamAttributes {
    /// Param is `In`
    pub const IN: u32 = 0x0001;
    /// Param is `out`
    pub const OUT: u32 = 0x0002;
    /// Param is optional
    pub const OPTIONAL: u32 = 0x0010;
    /// Param has default value
    pub const HAS_DEFAULT: u32 = 0x1000;
    /// Param has `FieldMarshal`
    pub const HAS_FIELD_MARSHAL: u32 = 0x2000;
    /// Reserved for runtime use; stripped when a parameter is defined
    pub const RESERVED_MASK: u32 = 0xF000;
}

/// Descriptor for one declared parameter of a method under construction.
///
/// Position 0 annotates the return value; positions 1..N are the ordinal
/// parameters. Created through
/// [`crate::metadata::emit::MethodDefBuilder::define_parameter`], which strips
/// the reserved attribute bits before the descriptor is stored.
#[derive(Debug, Clone)]
pub struct ParamBuilder {
    position: usize,
    attributes: u32,
    name: Option<String>,
}

impl ParamBuilder {
    pub(crate) fn new(position: usize, attributes: u32, name: Option<&str>) -> Self {
        ParamBuilder {
            position,
            attributes: attributes & !ParamAttributes::RESERVED_MASK,
            name: name.map(str::to_string),
        }
    }

    /// The parameter position (0 = return value, 1..N = ordinal parameters)
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The parameter attributes with reserved bits stripped
    #[must_use]
    pub fn attributes(&self) -> u32 {
        self.attributes
    }

    /// The declared parameter name, if one was supplied
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
