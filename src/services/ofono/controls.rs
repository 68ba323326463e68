use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument};

use super::{
    CallId, CellularContext, CellularError, Interface, ModemPath, NetworkOperator, SecurityCode,
    SettableProperty,
};

static PIN_FORMAT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9]{4,8}$").ok());
static PUK_FORMAT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9]{8}$").ok());

/// Whether `value` has the shape the SIM expects for `code`.
///
/// PINs are 4 to 8 digits, PUKs exactly 8.
pub fn is_valid_code(code: SecurityCode, value: &str) -> bool {
    let pattern = match code {
        SecurityCode::Pin | SecurityCode::Pin2 => &PIN_FORMAT,
        SecurityCode::Puk | SecurityCode::Puk2 => &PUK_FORMAT,
    };

    pattern
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value))
}

fn check_code(code: SecurityCode, value: &str) -> Result<(), CellularError> {
    if is_valid_code(code, value) {
        Ok(())
    } else {
        Err(CellularError::InvalidInput {
            field: "security code",
            reason: format!("not a valid {code}"),
        })
    }
}

fn unlocking_code(puk: SecurityCode) -> SecurityCode {
    match puk {
        SecurityCode::Puk2 | SecurityCode::Pin2 => SecurityCode::Pin2,
        SecurityCode::Puk | SecurityCode::Pin => SecurityCode::Pin,
    }
}

impl CellularContext {
    /// Power the modem on or off.
    ///
    /// # Errors
    /// Returns an error for an unknown modem or a rejected write.
    pub async fn set_powered(&self, path: &ModemPath, powered: bool) -> Result<(), CellularError> {
        self.set(path, SettableProperty::ModemPowered(powered)).await
    }

    /// Bring the radio online or put it in flight mode.
    ///
    /// # Errors
    /// Returns an error for an unknown modem or a rejected write.
    pub async fn set_online(&self, path: &ModemPath, online: bool) -> Result<(), CellularError> {
        self.set(path, SettableProperty::ModemOnline(online)).await
    }

    /// Allow or forbid packet data while roaming.
    ///
    /// # Errors
    /// Returns [`CellularError::CapabilityUnavailable`] while the connection
    /// manager is not attached.
    pub async fn set_roaming_allowed(
        &self,
        path: &ModemPath,
        allowed: bool,
    ) -> Result<(), CellularError> {
        self.set(path, SettableProperty::RoamingAllowed(allowed))
            .await
    }

    /// Enable or disable packet data.
    ///
    /// # Errors
    /// Returns [`CellularError::CapabilityUnavailable`] while the connection
    /// manager is not attached.
    pub async fn set_data_powered(
        &self,
        path: &ModemPath,
        powered: bool,
    ) -> Result<(), CellularError> {
        self.set(path, SettableProperty::DataPowered(powered)).await
    }

    #[instrument(skip(self))]
    async fn set(&self, path: &ModemPath, property: SettableProperty) -> Result<(), CellularError> {
        self.inner.registry().require(path, property.interface())?;
        self.inner.bus.set_property(path, property).await?;
        debug!(modem = %path, property = property.name(), "Property written");
        Ok(())
    }

    /// Answer the code the SIM is waiting for.
    ///
    /// # Errors
    /// Returns [`CellularError::InvalidInput`] for a malformed code, without
    /// spending a retry, or the daemon's error for a wrong one.
    #[instrument(skip(self, pin))]
    pub async fn enter_pin(
        &self,
        path: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        check_code(code, pin)?;
        self.require_sim(path)?;
        self.inner.bus.enter_pin(path, code, pin).await?;
        info!(modem = %path, %code, "Code accepted");
        Ok(())
    }

    /// Unblock the SIM with `puk` and set `new_pin`.
    ///
    /// # Errors
    /// Returns [`CellularError::InvalidInput`] for malformed codes or the
    /// daemon's error when the PUK is wrong.
    #[instrument(skip(self, puk, new_pin))]
    pub async fn reset_pin(
        &self,
        path: &ModemPath,
        code: SecurityCode,
        puk: &str,
        new_pin: &str,
    ) -> Result<(), CellularError> {
        check_code(code, puk)?;
        check_code(unlocking_code(code), new_pin)?;
        self.require_sim(path)?;
        self.inner.bus.reset_pin(path, code, puk, new_pin).await?;
        info!(modem = %path, %code, "SIM unblocked");
        Ok(())
    }

    /// Replace `old_pin` with `new_pin`.
    ///
    /// # Errors
    /// Returns [`CellularError::InvalidInput`] for malformed codes or the
    /// daemon's error when `old_pin` is wrong.
    #[instrument(skip(self, old_pin, new_pin))]
    pub async fn change_pin(
        &self,
        path: &ModemPath,
        code: SecurityCode,
        old_pin: &str,
        new_pin: &str,
    ) -> Result<(), CellularError> {
        check_code(code, old_pin)?;
        check_code(code, new_pin)?;
        self.require_sim(path)?;
        self.inner
            .bus
            .change_pin(path, code, old_pin, new_pin)
            .await?;
        info!(modem = %path, %code, "Code changed");
        Ok(())
    }

    /// Require `code` at power-up.
    ///
    /// # Errors
    /// Returns the daemon's error when `pin` is wrong.
    #[instrument(skip(self, pin))]
    pub async fn lock_pin(
        &self,
        path: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        check_code(code, pin)?;
        self.require_sim(path)?;
        self.inner.bus.lock_pin(path, code, pin).await
    }

    /// Stop requiring `code` at power-up.
    ///
    /// # Errors
    /// Returns the daemon's error when `pin` is wrong.
    #[instrument(skip(self, pin))]
    pub async fn unlock_pin(
        &self,
        path: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        check_code(code, pin)?;
        self.require_sim(path)?;
        self.inner.bus.unlock_pin(path, code, pin).await
    }

    fn require_sim(&self, path: &ModemPath) -> Result<(), CellularError> {
        self.inner.registry().require(path, Interface::SimManager)
    }

    /// List operators in the background; `reply` receives the result once.
    ///
    /// A full network scan can take a minute, hence the cancellable call id.
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// Returns [`CellularError::CapabilityUnavailable`] while network
    /// registration is not attached.
    #[instrument(skip(self, reply))]
    pub fn scan_operators_with<F>(
        &self,
        path: &ModemPath,
        scan: bool,
        reply: F,
    ) -> Result<CallId, CellularError>
    where
        F: FnOnce(Result<Vec<NetworkOperator>, CellularError>) + Send + 'static,
    {
        let (id, token) = {
            let mut registry = self.inner.registry();
            registry.require(path, Interface::NetworkRegistration)?;
            registry.begin_call(path)
        };

        let inner = Arc::clone(&self.inner);
        let path = path.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = token.cancelled() => Err(CellularError::Canceled),
                result = inner.bus.operators(&path, scan) => result,
            };

            if inner.registry().calls.take(id).is_none() {
                debug!(modem = %path, call_id = %id, "Operator listing finished after it was dropped");
            }
            reply(result);
        });

        Ok(id)
    }

    /// List operators, scanning when `scan` is set.
    ///
    /// # Errors
    /// Returns an error when network registration is unavailable or the scan fails.
    pub async fn operators(
        &self,
        path: &ModemPath,
        scan: bool,
    ) -> Result<Vec<NetworkOperator>, CellularError> {
        let (tx, rx) = oneshot::channel();
        self.scan_operators_with(path, scan, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| CellularError::Canceled)?
    }

    /// Register manually on `operator`.
    ///
    /// # Errors
    /// Returns an error when network registration is unavailable or the network refuses.
    #[instrument(skip(self))]
    pub async fn select_operator(
        &self,
        path: &ModemPath,
        operator: &NetworkOperator,
    ) -> Result<(), CellularError> {
        self.inner
            .registry()
            .require(path, Interface::NetworkRegistration)?;
        self.inner.bus.register_operator(&operator.path).await?;
        info!(modem = %path, operator = %operator.name, "Registered manually");
        Ok(())
    }

    /// Return to automatic operator selection.
    ///
    /// # Errors
    /// Returns an error when network registration is unavailable or the network refuses.
    #[instrument(skip(self))]
    pub async fn register_auto(&self, path: &ModemPath) -> Result<(), CellularError> {
        self.inner
            .registry()
            .require(path, Interface::NetworkRegistration)?;
        self.inner.bus.register_auto(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_and_puk_formats_differ() {
        assert!(is_valid_code(SecurityCode::Pin, "1234"));
        assert!(is_valid_code(SecurityCode::Pin2, "12345678"));
        assert!(!is_valid_code(SecurityCode::Pin, "123"));
        assert!(!is_valid_code(SecurityCode::Pin, "12a4"));
        assert!(is_valid_code(SecurityCode::Puk, "12345678"));
        assert!(!is_valid_code(SecurityCode::Puk2, "1234"));
    }
}
