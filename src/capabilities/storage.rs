use serde::{Deserialize, Serialize};
use thiserror::Error;

use crux_core::capability::{CapabilityContext, Operation};

pub const MAX_KEY_LENGTH: usize = 512;
pub const MAX_VALUE_SIZE: usize = 10 * 1024 * 1024;

/// Namespaced key into the shell's durable key-value store
/// (browser `localStorage`, mobile keystore).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    namespace: KeyNamespace,
    key: String,
}

impl StorageKey {
    pub fn new(namespace: KeyNamespace, key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        Self::validate_key(&key)?;
        Ok(Self { namespace, key })
    }

    pub fn session(key: impl Into<String>) -> Result<Self, StorageError> {
        Self::new(KeyNamespace::Session, key)
    }

    pub fn raw(&self) -> String {
        format!("{}:{}", self.namespace.prefix(), self.key)
    }

    pub fn namespace(&self) -> &KeyNamespace {
        &self.namespace
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: "key cannot be empty".to_string(),
            });
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(StorageError::InvalidKey {
                key: key.chars().take(50).collect::<String>() + "...",
                reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
            });
        }

        if key.contains('\0') || key.contains("..") {
            return Err(StorageError::InvalidKey {
                key: key.replace('\0', "\\0"),
                reason: "key contains forbidden sequences".to_string(),
            });
        }

        for c in key.chars() {
            if c.is_control() {
                return Err(StorageError::InvalidKey {
                    key: key.to_string(),
                    reason: "key contains control characters".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyNamespace {
    Session,
    Settings,
    Cache,
}

impl KeyNamespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyNamespace::Session => "session",
            KeyNamespace::Settings => "settings",
            KeyNamespace::Cache => "cache",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOperation {
    Get { key: StorageKey },
    Set { key: StorageKey, value: Vec<u8> },
    Delete { key: StorageKey },
}

impl Operation for StorageOperation {
    type Output = StorageResult;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum StorageError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage write failed: {message}")]
    WriteFailed { message: String },

    #[error("storage read failed: {message}")]
    ReadFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOutput {
    /// `None` when the key does not exist.
    Value(Option<Vec<u8>>),
    Done,
}

pub type StorageResult = Result<StorageOutput, StorageError>;

pub struct Storage<Ev> {
    context: CapabilityContext<StorageOperation, Ev>,
}

impl<Ev> crux_core::capability::Capability<Ev> for Storage<Ev> {
    type Operation = StorageOperation;
    type MappedSelf<MappedEv> = Storage<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Storage::new(self.context.map_event(f))
    }
}

impl<Ev> Storage<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<StorageOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get<F>(&self, key: StorageKey, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        self.request(StorageOperation::Get { key }, make_event);
    }

    pub fn set<F>(&self, key: StorageKey, value: Vec<u8>, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        if value.len() > MAX_VALUE_SIZE {
            let error = StorageError::ValueTooLarge {
                size: value.len(),
                max: MAX_VALUE_SIZE,
            };
            let context = self.context.clone();
            self.context.spawn(async move {
                context.update_app(make_event(Err(error)));
            });
            return;
        }
        self.request(StorageOperation::Set { key, value }, make_event);
    }

    pub fn delete<F>(&self, key: StorageKey, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        self.request(StorageOperation::Delete { key }, make_event);
    }

    fn request<F>(&self, operation: StorageOperation, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
