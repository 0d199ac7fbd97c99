//! Fabric 状态模块
//!
//! 此模块包含 Clos fabric 的标识符、链路占用表、分配状态、不变式检查与统计。

// 子模块声明
mod id;
mod state;
mod stats;
mod trunks;
mod validate;

// 重新导出公共接口
pub use id::{EgressId, IngressId, InputId, PortId, SpineId};
pub use state::AllocationState;
pub use stats::{FabricStats, Metrics, MetricsSnapshot};
pub use trunks::{Trunk, Trunks};
pub use validate::InvariantViolation;
