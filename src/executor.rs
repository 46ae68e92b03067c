//! Execution contexts that own memory and schedule data-parallel work.
//!
//! An [`Executor`] is a closed set of backends. Every [`Vector`](crate::vector::Vector) is bound
//! to exactly one executor, which allocates, reallocates and frees its buffer, and all kernels
//! dispatch on the executor of the data they touch.
//!
//! - [`SerialExecutor`] runs everything on the calling thread, in index order.
//! - [`HostParallelExecutor`] runs on rayon, either on the global pool or on a dedicated pool.
//! - [`DeviceExecutor`] runs on a dedicated queue of worker lanes, separate from the host pool.
//!
//! Executors compare equal when they are the same variant, regardless of the pool they hold.
use eyre::WrapErr;
use fvcore_traits::Element;
use log::{debug, trace, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::mem::size_of;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Runs all work sequentially on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

/// Runs work on host threads through rayon.
#[derive(Debug, Clone, Default)]
pub struct HostParallelExecutor {
    // None means the global rayon pool
    pool: Option<Arc<ThreadPool>>,
}

/// Runs work on a dedicated queue of lanes, standing in for an accelerator.
#[derive(Debug, Clone)]
pub struct DeviceExecutor {
    queue: Arc<ThreadPool>,
}

#[derive(Debug, Clone)]
pub enum Executor {
    Serial(SerialExecutor),
    HostParallel(HostParallelExecutor),
    Device(DeviceExecutor),
}

/// The variant tag of an [`Executor`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutorKind {
    #[serde(rename = "serial")]
    Serial,
    #[serde(rename = "cpu", alias = "host_parallel")]
    HostParallel,
    #[serde(rename = "gpu", alias = "device")]
    Device,
}

/// Settings from which an executor can be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutorSettings {
    pub kind: ExecutorKind,
    /// Number of lanes for a dedicated pool. Ignored by the serial executor.
    #[serde(default)]
    pub num_threads: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownExecutorError {
    name: String,
}

impl fmt::Display for UnknownExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unknown executor '{}'. Expected one of: serial, cpu, gpu", self.name)
    }
}

impl Error for UnknownExecutorError {}

impl Default for ExecutorKind {
    fn default() -> Self {
        Self::Serial
    }
}

impl FromStr for ExecutorKind {
    type Err = UnknownExecutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" | "SerialExecutor" => Ok(Self::Serial),
            "cpu" | "host_parallel" | "CPUExecutor" => Ok(Self::HostParallel),
            "gpu" | "device" | "GPUExecutor" => Ok(Self::Device),
            _ => Err(UnknownExecutorError { name: s.to_string() }),
        }
    }
}

fn build_pool(num_threads: usize, prefix: &'static str) -> eyre::Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(move |i| format!("{prefix}-{i}"))
        .build()
        .wrap_err_with(|| format!("Failed to build {prefix} pool with {num_threads} threads"))
}

fn default_device_queue() -> Arc<ThreadPool> {
    static QUEUE: OnceLock<Arc<ThreadPool>> = OnceLock::new();
    QUEUE
        .get_or_init(|| {
            // Without lanes there is nothing to run device kernels on, so this is fatal
            let pool = ThreadPoolBuilder::new()
                .thread_name(|i| format!("fvcore-device-{i}"))
                .build()
                .expect("Failed to initialize the default device queue");
            debug!("Initialized default device queue with {} lanes", pool.current_num_threads());
            Arc::new(pool)
        })
        .clone()
}

impl SerialExecutor {
    pub fn name(&self) -> &'static str {
        "SerialExecutor"
    }
}

impl HostParallelExecutor {
    /// An executor on the global rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor on a dedicated pool with the given number of threads.
    pub fn with_threads(num_threads: usize) -> eyre::Result<Self> {
        let pool = build_pool(num_threads, "fvcore-cpu")?;
        debug!("Created host parallel executor with {num_threads} threads");
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    pub fn name(&self) -> &'static str {
        "CPUExecutor"
    }

    pub fn num_lanes(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for DeviceExecutor {
    fn default() -> Self {
        Self {
            queue: default_device_queue(),
        }
    }
}

impl DeviceExecutor {
    /// An executor on the shared default device queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor on its own queue with the given number of lanes.
    pub fn with_lanes(num_lanes: usize) -> eyre::Result<Self> {
        let pool = build_pool(num_lanes, "fvcore-device")?;
        debug!("Created device executor with {num_lanes} lanes");
        Ok(Self { queue: Arc::new(pool) })
    }

    pub fn name(&self) -> &'static str {
        "GPUExecutor"
    }

    pub fn num_lanes(&self) -> usize {
        self.queue.current_num_threads()
    }

    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.queue.install(op)
    }
}

impl PartialEq for Executor {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl Eq for Executor {}

impl Default for Executor {
    fn default() -> Self {
        Self::Serial(SerialExecutor)
    }
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<SerialExecutor> for Executor {
    fn from(exec: SerialExecutor) -> Self {
        Self::Serial(exec)
    }
}

impl From<HostParallelExecutor> for Executor {
    fn from(exec: HostParallelExecutor) -> Self {
        Self::HostParallel(exec)
    }
}

impl From<DeviceExecutor> for Executor {
    fn from(exec: DeviceExecutor) -> Self {
        Self::Device(exec)
    }
}

impl Executor {
    pub fn serial() -> Self {
        Self::Serial(SerialExecutor)
    }

    pub fn host_parallel() -> Self {
        Self::HostParallel(HostParallelExecutor::new())
    }

    pub fn device() -> Self {
        Self::Device(DeviceExecutor::new())
    }

    pub fn from_settings(settings: &ExecutorSettings) -> eyre::Result<Self> {
        let exec = match (settings.kind, settings.num_threads) {
            (ExecutorKind::Serial, Some(n)) => {
                warn!("Ignoring num_threads = {n} for the serial executor");
                Self::serial()
            }
            (ExecutorKind::Serial, None) => Self::serial(),
            (ExecutorKind::HostParallel, Some(n)) => HostParallelExecutor::with_threads(n)?.into(),
            (ExecutorKind::HostParallel, None) => Self::host_parallel(),
            (ExecutorKind::Device, Some(n)) => DeviceExecutor::with_lanes(n)?.into(),
            (ExecutorKind::Device, None) => Self::device(),
        };
        debug!("Constructed {} from settings {:?}", exec.name(), settings);
        Ok(exec)
    }

    pub fn kind(&self) -> ExecutorKind {
        match self {
            Self::Serial(_) => ExecutorKind::Serial,
            Self::HostParallel(_) => ExecutorKind::HostParallel,
            Self::Device(_) => ExecutorKind::Device,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Serial(exec) => exec.name(),
            Self::HostParallel(exec) => exec.name(),
            Self::Device(exec) => exec.name(),
        }
    }

    pub fn is_serial(&self) -> bool {
        matches!(self, Self::Serial(_))
    }

    /// Number of lanes that may execute loop bodies concurrently.
    pub fn num_lanes(&self) -> usize {
        match self {
            Self::Serial(_) => 1,
            Self::HostParallel(exec) => exec.num_lanes(),
            Self::Device(exec) => exec.num_lanes(),
        }
    }

    /// Runs `op` on the lanes of this executor.
    ///
    /// Parallel iterators used inside `op` are scheduled on the executor's pool.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self {
            Self::Serial(_) => op(),
            Self::HostParallel(exec) => exec.install(op),
            Self::Device(exec) => exec.install(op),
        }
    }

    /// Blocks until all work previously launched on this executor has completed.
    ///
    /// Launches return only after completion, so there is never outstanding work. Callers that
    /// read device results on the host should still fence, so that they stay correct for
    /// queues that complete asynchronously.
    pub fn fence(&self) {
        if let Self::Device(exec) = self {
            trace!("{}: fence", exec.name());
        }
    }

    /// Allocates a zero-initialized buffer of `len` elements.
    ///
    /// Allocation failure aborts the process.
    pub fn alloc<T: Element>(&self, len: usize) -> Vec<T> {
        trace!("{}: alloc {} bytes", self.name(), len * size_of::<T>());
        vec![T::zero(); len]
    }

    /// Resizes a buffer owned by this executor, preserving the first `min(old, new)` elements.
    ///
    /// New elements are zero. A buffer reallocated to zero length holds no memory.
    pub fn realloc<T: Element>(&self, mut buffer: Vec<T>, len: usize) -> Vec<T> {
        trace!(
            "{}: realloc {} -> {} bytes",
            self.name(),
            buffer.len() * size_of::<T>(),
            len * size_of::<T>()
        );
        buffer.resize(len, T::zero());
        buffer.shrink_to_fit();
        buffer
    }

    /// Releases a buffer owned by this executor.
    pub fn free<T: Element>(&self, buffer: Vec<T>) {
        if buffer.capacity() > 0 {
            trace!("{}: free {} bytes", self.name(), buffer.capacity() * size_of::<T>());
        }
        drop(buffer);
    }
}

/// Copies `src`, resident on `src_exec`, into `dst`, resident on `dst_exec`.
///
/// This is the only path through which data moves between executors. The transfer runs on the
/// lanes of the destination if it is parallel, otherwise on the lanes of the source.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn deep_copy<T: Element>(src: &[T], dst: &mut [T], src_exec: &Executor, dst_exec: &Executor) {
    assert_eq!(src.len(), dst.len(), "Source and destination of a deep copy must have equal length.");
    trace!("deep copy of {} elements: {} -> {}", src.len(), src_exec.name(), dst_exec.name());

    let lanes = if dst_exec.is_serial() { src_exec } else { dst_exec };
    match lanes {
        Executor::Serial(_) => dst.copy_from_slice(src),
        _ => lanes.install(|| {
            dst.par_iter_mut()
                .zip(src.par_iter())
                .for_each(|(d, s)| *d = *s)
        }),
    }
}
