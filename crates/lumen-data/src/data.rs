//! Descriptors passed between the pipeline and its fetchers.

use std::any::TypeId;
use std::fmt;

/// Scheduling hint for a fetch.
///
/// Fetchers accept and propagate it; ordering requests by priority is left to
/// the caller or the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Immediate,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Immediate => write!(f, "immediate"),
        }
    }
}

/// Where fetched bytes originated.
///
/// Reported so the pipeline can decide what to cache; fetchers never act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    /// Bytes read from the local device.
    Local,
    /// Bytes fetched from a remote server.
    Remote,
}

impl DataSource {
    pub fn is_remote(self) -> bool {
        matches!(self, DataSource::Remote)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Local => write!(f, "LOCAL"),
            DataSource::Remote => write!(f, "REMOTE"),
        }
    }
}

/// Runtime descriptor of the payload type a fetcher delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataClass {
    id: TypeId,
    name: &'static str,
}

impl DataClass {
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: 'static + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for DataClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
