//! Booking Server - 餐厅订位助手
//!
//! # 架构概述
//!
//! - **容量引擎** (`capacity`): 时段分类、座位账本、准入判定
//! - **预订** (`booking`): 准入 + 写入的串行化入口，候补名单
//! - **存储** (`store`): Google Sheets / 内存表格，按表头列名读写
//! - **日历** (`calendar`): Google Calendar 镜像 (best-effort)
//! - **聊天** (`bot`): Telegram 对话式预订与员工操作
//! - **HTTP API** (`api`): 网站预订 webhook 与健康检查
//!
//! # 模块结构
//!
//! ```text
//! booking-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── capacity/      # 分类器、账本、准入
//! ├── booking/       # BookingService、候补
//! ├── reservations/  # 表头能力、写入、到店
//! ├── store/         # ReservationStore 适配器
//! ├── calendar/      # CalendarService 适配器
//! ├── google/        # 服务账号令牌
//! ├── bot/           # Telegram 前端
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志、时区
//! ```

pub mod api;
pub mod booking;
pub mod bot;
pub mod calendar;
pub mod capacity;
pub mod core;
pub mod google;
pub mod reservations;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use booking::{Booked, BookingError, BookingService};
pub use capacity::{AdmissionController, AdmissionDecision, CapacityLedger, CapacitySettings};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger;

pub fn print_banner() {
    println!(
        r#"
    ____              __   _
   / __ )____  ____  / /__(_)___  ____ _
  / __  / __ \/ __ \/ //_/ / __ \/ __ `/
 / /_/ / /_/ / /_/ / ,< / / / / / /_/ /
/_____/\____/\____/_/|_/_/_/ /_/\__, /
                               /____/
    "#
    );
}
