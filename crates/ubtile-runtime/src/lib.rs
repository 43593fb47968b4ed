//! Host/device wire contract for ubtile plans
//!
//! Turns a [`ubtile_core::TilingPlan`] into what a kernel launch consumes: a
//! [`CLaunchConfig`] (core count and kernel variant) and a byte-stable
//! tiling record in one of the [`TilingData`] layouts.
//!
//! ```
//! use ubtile_core::{PlatformBudget, Tiler, WorkDescriptor};
//! use ubtile_runtime::{ElementwiseTilingData, LaunchPackage};
//!
//! let plan = Tiler::new(PlatformBudget::new(8, 2048, 32)?)
//!     .plan(&WorkDescriptor::new(1000, 4, 2)?)?;
//! let package = LaunchPackage::new::<ElementwiseTilingData>(&plan)?;
//! assert_eq!(package.launch.block_dim, 8);
//! assert_eq!(package.tiling.len(), 64);
//! # Ok::<(), ubtile_runtime::RecordError>(())
//! ```

pub mod abi;
pub mod error;
pub mod marshaller;
pub mod record;
pub mod types;
pub mod unmarshaller;

pub use abi::*;
pub use error::{RecordError, Result};
pub use marshaller::Marshaller;
pub use record::{
    CoreSpanTilingData, ElementwiseTilingData, EqualTilingData, LaunchPackage, LessTilingData, TilingData,
};
pub use types::{LeScalar, Pod};
pub use unmarshaller::Unmarshaller;
