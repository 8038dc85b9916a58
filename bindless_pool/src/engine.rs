/// Engine - process-wide singleton for the pool registry and logging
///
/// The registry is created once by `Engine::initialize()` and lives until the
/// process exits. Handles reach their pool through it, so it is never torn
/// down while handles may still be alive.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock, RwLock};
use std::time::SystemTime;
use crate::error::{Error, Result};
use crate::log::{log_error, DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::registry::Registry;
use crate::resource::{ResourceManager, ResourceManagerDesc};

// ===== INTERNAL STATE =====

/// Process-wide registry (write-once)
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Resource manager singleton (write-once, like the pools it registers)
static RESOURCE_MANAGER: OnceLock<Arc<ResourceManager>> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Minimum severity forwarded to the logger (stored as `LogSeverity as u8`)
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(LogSeverity::Info as u8);

// ===== PUBLIC API =====

/// Engine singleton manager
///
/// # Example
///
/// ```no_run
/// use bindless_pool::bpool::{Engine, Handle, PoolId, ResourcePool};
/// use std::sync::Arc;
///
/// Engine::initialize()?;
/// let id = PoolId::new(1);
/// Engine::registry()?.register_pool(id, Arc::new(ResourcePool::<u32>::new(64, "counters")))?;
/// let handle = Handle::<u32>::new(id)?;
/// # Ok::<(), bindless_pool::bpool::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Initialize the engine
    ///
    /// Creates the process registry. Idempotent: later calls keep the
    /// existing registry and its registrations.
    pub fn initialize() -> Result<()> {
        let mut created = false;
        REGISTRY.get_or_init(|| {
            created = true;
            Registry::new()
        });
        if created {
            crate::engine_info!("bpool::Engine", "Registry created ({} pool slots)", crate::registry::MAX_POOLS);
        }
        Ok(())
    }

    /// Whether `initialize()` has been called
    pub fn is_initialized() -> bool {
        REGISTRY.get().is_some()
    }

    /// Get the process registry
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the engine is not initialized.
    pub fn registry() -> Result<&'static Registry> {
        REGISTRY.get().ok_or_else(|| {
            log_error("bpool::Engine", Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })
    }

    // ===== RESOURCE MANAGER API =====

    /// Create the process resource manager
    ///
    /// Its pools are registered for the lifetime of the process, so there
    /// is no matching destroy: the manager lives as long as the registry.
    ///
    /// # Errors
    ///
    /// - `InitializationFailed` if the engine is not initialized or the
    ///   manager already exists
    /// - any error of `ResourceManager::new`
    pub fn create_resource_manager(desc: ResourceManagerDesc) -> Result<Arc<ResourceManager>> {
        if RESOURCE_MANAGER.get().is_some() {
            return Err(log_error("bpool::Engine", Error::InitializationFailed(
                "ResourceManager already exists".to_string(),
            )));
        }

        let manager = Arc::new(ResourceManager::new(desc)?);
        RESOURCE_MANAGER.set(manager.clone()).map_err(|_| {
            log_error("bpool::Engine", Error::InitializationFailed(
                "ResourceManager created concurrently".to_string(),
            ))
        })?;
        Ok(manager)
    }

    /// Get the process resource manager
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if it has not been created.
    pub fn resource_manager() -> Result<Arc<ResourceManager>> {
        RESOURCE_MANAGER.get().cloned().ok_or_else(|| {
            log_error("bpool::Engine", Error::InitializationFailed(
                "ResourceManager not created. Call Engine::create_resource_manager() first.".to_string(),
            ))
        })
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bindless_pool::bpool::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Set the minimum severity forwarded to the logger (default: Info)
    pub fn set_min_severity(severity: LogSeverity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    /// Whether a message of this severity would reach the logger
    ///
    /// Checked by the logging macros before formatting.
    pub fn is_enabled(severity: LogSeverity) -> bool {
        severity as u8 >= MIN_SEVERITY.load(Ordering::Relaxed)
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
