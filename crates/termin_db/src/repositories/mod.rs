//! Repository implementations of the `termin-common` store traits.

mod codec;

pub mod appointment_sql;
pub mod block_sql;
pub mod config_sql;
pub mod user_sql;

pub use appointment_sql::SqlAppointmentRepository;
pub use block_sql::SqlBlockRepository;
pub use config_sql::SqlConfigRepository;
pub use user_sql::SqlUserRepository;
