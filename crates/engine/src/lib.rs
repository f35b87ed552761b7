pub use access::{Actor, Claims, Decision, Owned, Ownership, Reference};
pub use accounts::{Account, AccountType};
pub use categories::Category;
pub use dashboard::{BalanceSummary, Bucket};
pub use error::EngineError;
pub use groups::Group;
pub use ops::{
    AccountDraft, Engine, EngineBuilder, NameDraft, Page, PageRequest, Privileges,
    TransactionDraft, UserDraft, WriteMode,
};
pub use transactions::{Transaction, TransactionKind};
pub use users::User;
pub use vendors::Vendor;

pub mod access;
mod accounts;
mod categories;
mod dashboard;
mod error;
mod groups;
pub mod money;
mod ops;
mod transactions;
mod user_groups;
mod users;
mod vendors;

pub type ResultEngine<T> = Result<T, EngineError>;
