use tracing::warn;

use crate::{
    chain::{ChainError, ObjectId, EVENT_PAGE_LIMIT},
    context::ChatContext,
    models::Room,
    GetField,
};

pub const ROOM_CREATED: &str = "RoomCreated";

/// Every room announced by a creation event, newest first.
pub async fn list_rooms(ctx: &ChatContext) -> Result<Vec<Room>, ChainError> {
    let Some(event_type) = ctx.chat_type(ROOM_CREATED) else {
        return Ok(Vec::new());
    };

    let mut ids: Vec<ObjectId> = Vec::new();
    for event in ctx.chain.query_events(&event_type, EVENT_PAGE_LIMIT, true).await? {
        match event.parsed_json.get_id_field("room_id") {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(e) => warn!("skipping room event: {e}"),
        }
    }
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rooms = ctx
        .chain
        .multi_get_objects(&ids)
        .await?
        .iter()
        .filter_map(|object| {
            Room::try_from(object)
                .inspect_err(|e| warn!(room = %object.id, "undecodable room: {e}"))
                .ok()
        })
        .collect();
    Ok(rooms)
}

pub async fn get_room(ctx: &ChatContext, id: &ObjectId) -> Result<Option<Room>, ChainError> {
    if ctx.package().is_none() {
        return Ok(None);
    }
    ctx.chain
        .get_object(id)
        .await?
        .as_ref()
        .map(Room::try_from)
        .transpose()
}
