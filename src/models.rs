//! Read-only projections of the contract's objects.
//!
//! Timestamps are the chain clock in milliseconds.

use crate::{
    chain::{Address, ChainError, MoveObject, ObjectId},
    GetField,
};

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: ObjectId,
    pub owner: Address,
    pub username: String,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    pub creator: Address,
    pub created_at: u64,
    pub updated_at: u64,
    pub member_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: ObjectId,
    pub room_id: ObjectId,
    pub author: Address,
    pub content: String,
    pub created_at: u64,
}

impl TryFrom<&MoveObject> for UserProfile {
    type Error = ChainError;

    fn try_from(object: &MoveObject) -> Result<Self, Self::Error> {
        let fields = &object.fields;
        Ok(UserProfile {
            id: object.id.clone(),
            owner: fields.get_address_field("owner")?,
            username: fields.get_str_field("username")?,
            created_at: fields.get_u64_field("created_at")?,
            updated_at: fields.get_u64_field("updated_at")?,
        })
    }
}

impl TryFrom<&MoveObject> for Room {
    type Error = ChainError;

    fn try_from(object: &MoveObject) -> Result<Self, Self::Error> {
        let fields = &object.fields;
        Ok(Room {
            id: object.id.clone(),
            name: fields.get_str_field("name")?,
            description: fields.get_str_field("description").unwrap_or_default(),
            creator: fields.get_address_field("creator")?,
            created_at: fields.get_u64_field("created_at")?,
            updated_at: fields.get_u64_field("updated_at")?,
            member_count: fields.get_u64_field("member_count")?,
        })
    }
}

impl TryFrom<&MoveObject> for Message {
    type Error = ChainError;

    fn try_from(object: &MoveObject) -> Result<Self, Self::Error> {
        let fields = &object.fields;
        Ok(Message {
            id: object.id.clone(),
            room_id: fields.get_id_field("room_id")?,
            author: fields.get_address_field("author")?,
            content: fields.get_str_field("content")?,
            created_at: fields.get_u64_field("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::chain::fake::{addr, id};

    #[test]
    fn projects_room() {
        let object = MoveObject {
            id: id("0x10"),
            object_type: "0x1::chat::Room".to_owned(),
            fields: json!({
                "id": { "id": "0x10" },
                "name": "general",
                "description": "",
                "creator": "0x1",
                "created_at": "5",
                "updated_at": "6",
                "member_count": "2",
            }),
        };
        let room = Room::try_from(&object).unwrap();
        assert_eq!(room.name, "general");
        assert_eq!(room.creator, addr("0x1"));
        assert_eq!(room.member_count, 2);
    }

    #[test]
    fn projects_message_with_wrapped_room_id() {
        let object = MoveObject {
            id: id("0x20"),
            object_type: "0x1::chat::Message".to_owned(),
            fields: json!({
                "room_id": { "id": "0x10" },
                "author": "0x1",
                "content": "hello",
                "created_at": "300",
            }),
        };
        let message = Message::try_from(&object).unwrap();
        assert_eq!(message.room_id, id("0x10"));
        assert_eq!(message.created_at, 300);
    }

    #[test]
    fn missing_fields_are_decode_errors() {
        let object = MoveObject {
            id: id("0x30"),
            object_type: "0x1::chat::UserProfile".to_owned(),
            fields: json!({ "owner": "0x1" }),
        };
        assert!(matches!(UserProfile::try_from(&object), Err(ChainError::Decode(_))));
    }
}
