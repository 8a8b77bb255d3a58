/// A raw ("unresolved") configuration structure that can be validated
/// into its typed ("resolved") counterpart.
pub trait ResolvableConfiguration {
    type Resolved;
    type Error;

    /// Validate `self` and turn it into its `Resolved` type.
    /// Return `Err` if the raw values don't describe a usable configuration.
    fn resolve(self) -> Result<Self::Resolved, Self::Error>;
}


/// Like [`ResolvableConfiguration`], but resolution needs some outside
/// information, e.g. placeholders derived from the configuration file location.
pub trait ResolvableConfigurationWithContext {
    type Context;
    type Resolved;
    type Error;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, Self::Error>;
}
