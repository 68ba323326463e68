//! oFono NetworkOperator interface.

use zbus::proxy;

use super::Properties;

/// An operator found by a scan.
#[proxy(default_service = "org.ofono", interface = "org.ofono.NetworkOperator")]
pub trait NetworkOperator {
    /// Operator properties.
    fn get_properties(&self) -> zbus::Result<Properties>;

    /// Manually register on this operator.
    fn register(&self) -> zbus::Result<()>;
}
