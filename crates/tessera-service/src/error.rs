use thiserror::Error;

/// Service layer errors - combines the scheduling and storage error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Schedule(#[from] tessera_sched::error::ScheduleError),

    #[error(transparent)]
    Store(#[from] tessera_store::error::StoreError),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
