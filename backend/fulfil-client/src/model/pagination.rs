use crate::error::FulfilError;
use crate::model::ModelApi;

use futures_util::stream::{self, Stream, TryStreamExt};
use log::debug;
use serde_json::Value;

pub const DEFAULT_BATCH_SIZE: usize = 500;

struct PageCursor<'a, M> {
    model: &'a M,
    domain: Value,
    order: Option<Value>,
    fields: Vec<String>,
    batch_size: usize,
    offset: usize,
    exhausted: bool,
}

pub(crate) fn search_read_all<'a, M: ModelApi>(
    model: &'a M,
    domain: Value,
    order: Option<Value>,
    fields: Vec<String>,
    batch_size: Option<usize>,
) -> impl Stream<Item = Result<Value, FulfilError>> + 'a {
    let cursor = PageCursor {
        model,
        domain,
        order,
        fields,
        batch_size: batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
        offset: 0,
        exhausted: false,
    };

    stream::try_unfold(cursor, |mut cursor| async move {
        if cursor.exhausted {
            return Ok(None);
        }

        let page = {
            let fields: Vec<&str> = cursor.fields.iter().map(String::as_str).collect();
            cursor
                .model
                .search_read(
                    cursor.domain.clone(),
                    Some(cursor.offset),
                    Some(cursor.batch_size),
                    cursor.order.clone(),
                    &fields,
                )
                .await?
        };

        debug!(
            "{}: page at offset {} returned {} records",
            cursor.model.name(),
            cursor.offset,
            page.len()
        );

        if page.is_empty() {
            return Ok(None);
        }

        cursor.exhausted = page.len() < cursor.batch_size;
        cursor.offset += page.len();
        Ok::<_, FulfilError>(Some((page, cursor)))
    })
    .map_ok(|page| stream::iter(page.into_iter().map(Ok::<Value, FulfilError>)))
    .try_flatten()
}
