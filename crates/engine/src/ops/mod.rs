use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, PrimaryKeyTrait,
    Select, SqlErr,
};

use crate::{EngineError, ResultEngine, access::Reference};

mod access;
mod accounts;
mod dashboard;
mod groups;
mod reference_data;
mod transactions;
mod users;

pub use accounts::AccountDraft;
pub use transactions::TransactionDraft;
pub use users::{Privileges, UserDraft};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// How much of a resource a write carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Every required field must be present (create, full update).
    Full,
    /// Only the fields present are changed.
    Partial,
}

/// Payload of the name-only resources (groups, categories, vendors).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameDraft {
    pub name: Option<String>,
}

/// A 1-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size: size.max(1),
        }
    }
}

/// One page of a collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// Number of items in the whole collection.
    pub count: u64,
    pub page: u64,
    pub pages: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            pages: self.pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }

    fn try_map<U>(self, f: impl FnMut(T) -> ResultEngine<U>) -> ResultEngine<Page<U>> {
        Ok(Page {
            count: self.count,
            page: self.page,
            pages: self.pages,
            items: self.items.into_iter().map(f).collect::<ResultEngine<_>>()?,
        })
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn fetch_page<E>(
        &self,
        select: Select<E>,
        request: PageRequest,
    ) -> ResultEngine<Page<E::Model>>
    where
        E: EntityTrait,
        E::Model: Send + Sync + 'static,
    {
        let paginator = select.paginate(&self.database, request.size);
        let count = paginator.num_items().await?;
        let pages = count.div_ceil(request.size).max(1);
        if request.page == 0 || request.page > pages {
            return Err(EngineError::KeyNotFound(format!("page {}", request.page)));
        }

        let items = paginator.fetch_page(request.page - 1).await?;
        Ok(Page {
            count,
            page: request.page,
            pages,
            items,
        })
    }
}

/// Trims a required name and checks its length.
fn normalize_required_name(value: &str, field: &str, max_len: usize) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{field}: this field may not be blank"
        )));
    }
    if trimmed.chars().count() > max_len {
        return Err(EngineError::Validation(format!(
            "{field}: ensure this field has no more than {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Reports a unique-constraint violation on `key` as [`EngineError::ExistingKey`].
///
/// Covers the race where a concurrent write takes the key after the
/// uniqueness check ran.
fn existing_key(key: &str) -> impl FnOnce(DbErr) -> EngineError + '_ {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::ExistingKey(key.to_string()),
        _ => EngineError::Database(err),
    }
}

/// Resolves a client reference to the id of an existing `E` row.
async fn resolve_reference<E>(
    db: &impl ConnectionTrait,
    reference: &Reference,
    field: &str,
) -> ResultEngine<i64>
where
    E: EntityTrait,
    i64: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    let invalid =
        || EngineError::Validation(format!("{field}: invalid reference, object does not exist"));
    let id = reference.id().ok_or_else(invalid)?;
    E::find_by_id(id).one(db).await?.ok_or_else(invalid)?;
    Ok(id)
}

/// Returns the value for a required field, honouring the write mode.
fn required<T>(value: Option<T>, field: &str, mode: WriteMode) -> ResultEngine<Option<T>> {
    match (value, mode) {
        (None, WriteMode::Full) => Err(EngineError::required(field)),
        (value, _) => Ok(value),
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
