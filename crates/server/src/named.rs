//! Categories and vendors API endpoints.

use api_types::{
    Page, PageQuery,
    named::{NameWrite, NamedView},
};
use axum::{Extension, extract::State, http::StatusCode};
use engine::{Actor, Category, NameDraft, Vendor, WriteMode};

use crate::{Json, Path, Query, ServerError, pagination, server::ServerState};

trait Named {
    fn into_view(self, base: &str) -> NamedView;
}

macro_rules! impl_named {
    ($domain:ty) => {
        impl Named for $domain {
            fn into_view(self, base: &str) -> NamedView {
                NamedView {
                    id: self.id,
                    url: format!("{base}{}/", self.id),
                    name: self.name,
                    created: self.created,
                    last_updated: self.last_updated,
                }
            }
        }
    };
}

impl_named!(Category);
impl_named!(Vendor);

fn draft(payload: NameWrite) -> NameDraft {
    NameDraft { name: payload.name }
}

/// Generates the CRUD handlers of a name-only resource served under `$base`.
macro_rules! named_handlers {
    (
        $base:literal,
        ($list:ident => $engine_list:ident),
        ($create:ident => $engine_create:ident),
        ($retrieve:ident => $engine_get:ident),
        ($update:ident, $partial_update:ident => $engine_update:ident),
        ($destroy:ident => $engine_delete:ident)
    ) => {
        pub async fn $list(
            Extension(_actor): Extension<Actor>,
            State(state): State<ServerState>,
            Query(query): Query<PageQuery>,
        ) -> Result<Json<Page<NamedView>>, ServerError> {
            let page = state
                .engine
                .$engine_list(pagination::request(&query, &state))
                .await?;
            Ok(Json(pagination::envelope(page, $base, |item| {
                item.into_view($base)
            })))
        }

        pub async fn $create(
            Extension(actor): Extension<Actor>,
            State(state): State<ServerState>,
            Json(payload): Json<NameWrite>,
        ) -> Result<(StatusCode, Json<NamedView>), ServerError> {
            let item = state.engine.$engine_create(&actor, draft(payload)).await?;
            Ok((StatusCode::CREATED, Json(item.into_view($base))))
        }

        pub async fn $retrieve(
            Extension(_actor): Extension<Actor>,
            State(state): State<ServerState>,
            Path(id): Path<i64>,
        ) -> Result<Json<NamedView>, ServerError> {
            let item = state.engine.$engine_get(id).await?;
            Ok(Json(item.into_view($base)))
        }

        pub async fn $update(
            Extension(actor): Extension<Actor>,
            State(state): State<ServerState>,
            Path(id): Path<i64>,
            Json(payload): Json<NameWrite>,
        ) -> Result<Json<NamedView>, ServerError> {
            let item = state
                .engine
                .$engine_update(&actor, id, draft(payload), WriteMode::Full)
                .await?;
            Ok(Json(item.into_view($base)))
        }

        pub async fn $partial_update(
            Extension(actor): Extension<Actor>,
            State(state): State<ServerState>,
            Path(id): Path<i64>,
            Json(payload): Json<NameWrite>,
        ) -> Result<Json<NamedView>, ServerError> {
            let item = state
                .engine
                .$engine_update(&actor, id, draft(payload), WriteMode::Partial)
                .await?;
            Ok(Json(item.into_view($base)))
        }

        pub async fn $destroy(
            Extension(actor): Extension<Actor>,
            State(state): State<ServerState>,
            Path(id): Path<i64>,
        ) -> Result<StatusCode, ServerError> {
            state.engine.$engine_delete(&actor, id).await?;
            Ok(StatusCode::NO_CONTENT)
        }
    };
}

named_handlers!(
    "/category/",
    (list_categories => list_categories),
    (create_category => create_category),
    (retrieve_category => category),
    (update_category, partial_update_category => update_category),
    (destroy_category => delete_category)
);

named_handlers!(
    "/vendors/",
    (list_vendors => list_vendors),
    (create_vendor => create_vendor),
    (retrieve_vendor => vendor),
    (update_vendor, partial_update_vendor => update_vendor),
    (destroy_vendor => delete_vendor)
);
