//! Validation Module
//!
//! Pluggable per-record-type structural validation.
//!
//! ## Responsibilities
//! - Generic envelope checks shared by every type (shape, version)
//! - Dispatch to the validator registered for the record type
//! - Allow new types to register without touching existing ones
//!
//! ## Validation Order (first failure wins)
//! 1. Shape: payload field present, reserved keys not shadowed
//! 2. Version: in the type's supported set
//! 3. Type-specific metadata checks
//! 4. Type-specific payload checks

mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RecordType;
use crate::document::Envelope;
use crate::error::{Result, VaultError};

pub use builtin::{ChatValidator, DocumentValidator, LogValidator, SettingsValidator};

/// Structural validation for one record type
pub trait Validator: Send + Sync {
    /// Fail with `VaultError::InvalidFormat` naming the violated rule
    fn validate(&self, envelope: &Envelope) -> Result<()>;
}

impl<F> Validator for F
where
    F: Fn(&Envelope) -> Result<()> + Send + Sync,
{
    fn validate(&self, envelope: &Envelope) -> Result<()> {
        self(envelope)
    }
}

/// Maps record type names to validators
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    /// An empty registry (generic checks only)
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with validators for chat, document, settings and log
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("chat", ChatValidator::default());
        registry.register("document", DocumentValidator::default());
        registry.register("settings", SettingsValidator);
        registry.register("log", LogValidator::default());
        registry
    }

    /// Register (or replace) the validator for a record type
    pub fn register<V>(&mut self, type_name: impl Into<String>, validator: V)
    where
        V: Validator + 'static,
    {
        self.validators.insert(type_name.into(), Arc::new(validator));
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn Validator>> {
        self.validators.get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.validators.contains_key(type_name)
    }

    /// Run the generic checks, then the type's validator if one is registered
    pub fn validate(&self, record_type: &RecordType, envelope: &Envelope) -> Result<()> {
        // Step 1: Shape
        envelope.check_reserved()?;
        if !envelope.body.contains_key(&record_type.payload_field) {
            return Err(VaultError::invalid_format(format!(
                "missing payload field '{}'",
                record_type.payload_field
            )));
        }

        // Step 2: Version
        if !record_type
            .supported_versions
            .iter()
            .any(|v| *v == envelope.version)
        {
            return Err(VaultError::invalid_format(format!(
                "unsupported version '{}' for type '{}'",
                envelope.version, record_type.name
            )));
        }

        // Steps 3-4: Type-specific
        match self.validators.get(&record_type.name) {
            Some(validator) => validator.validate(envelope),
            None => Ok(()),
        }
    }
}
