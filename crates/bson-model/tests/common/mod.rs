#![allow(dead_code)]

//! Hand-written models in the shape a generator would emit, plus helpers
//! shared by the integration tests.

use std::sync::{Arc, OnceLock};

use bson_model::{
    path, DocumentSchema, GenericValue, MapKey, Model, ModelError, ObjectShape, RootModel, Shape,
    StandardCodec, UpdateDocument,
};
use serde_json::Value;

pub fn wallet_shape() -> Arc<ObjectShape> {
    ObjectShape::builder()
        .field("coins", Shape::int64())
        .field("gems", Shape::int32())
        .build()
        .expect("wallet shape")
}

pub fn item_shape() -> Arc<ObjectShape> {
    ObjectShape::builder()
        .field("name", Shape::string())
        .field("qty", Shape::int32())
        .build()
        .expect("item shape")
}

pub fn equipment_shape() -> Arc<ObjectShape> {
    ObjectShape::builder()
        .field("slots", Shape::array(Shape::string()))
        .field_with_default("weight", Shape::double(), 1.5)
        .build()
        .expect("equipment shape")
}

pub struct Player {
    root: RootModel,
}

impl Model for Player {
    fn schema() -> Arc<DocumentSchema> {
        static SCHEMA: OnceLock<Arc<DocumentSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                let shape = ObjectShape::builder()
                    .field("_id", Shape::string())
                    .field("name", Shape::string())
                    .field("age", Shape::int32())
                    .field("nickname", Shape::string().nullable())
                    .field("wallet", Shape::object(wallet_shape()))
                    .field("equipment", Shape::object(equipment_shape()))
                    .field("tags", Shape::array(Shape::string()))
                    .field("scores", Shape::map(MapKey::Int, Shape::int32()))
                    .field("inventory", Shape::array(Shape::object(item_shape())))
                    .build()
                    .expect("player shape");
                Arc::new(DocumentSchema::new(shape).expect("player schema"))
            })
            .clone()
    }

    fn from_root(root: RootModel) -> Self {
        Self { root }
    }

    fn root(&self) -> &RootModel {
        &self.root
    }

    fn root_mut(&mut self) -> &mut RootModel {
        &mut self.root
    }
}

impl Player {
    pub fn name(&self) -> &str {
        self.root
            .get(&path!("name"))
            .ok()
            .and_then(|n| n.as_scalar())
            .and_then(|s| s.as_str())
            .unwrap_or_default()
    }

    pub fn set_name(&mut self, name: &str) -> Result<bool, ModelError> {
        self.root.field("name").set(name)
    }

    pub fn age(&self) -> i32 {
        self.root
            .get(&path!("age"))
            .ok()
            .and_then(|n| n.as_scalar())
            .and_then(|s| s.as_i32())
            .unwrap_or_default()
    }

    pub fn set_age(&mut self, age: i32) -> Result<bool, ModelError> {
        self.root.field("age").set(age)
    }

    pub fn set_nickname(&mut self, nickname: Option<&str>) -> Result<bool, ModelError> {
        self.root.field("nickname").set(nickname)
    }

    pub fn coins(&self) -> i64 {
        self.root
            .get(&path!("wallet", "coins"))
            .ok()
            .and_then(|n| n.as_scalar())
            .and_then(|s| s.as_i64())
            .unwrap_or_default()
    }

    pub fn set_coins(&mut self, coins: i64) -> Result<bool, ModelError> {
        self.root.at(path!("wallet", "coins")).set(coins)
    }

    pub fn push_tag(&mut self, tag: &str) -> Result<(), ModelError> {
        self.root.field("tags").push(tag)
    }

    pub fn root_model_mut(&mut self) -> &mut RootModel {
        &mut self.root
    }
}

/// A second document type with an ObjectId identifier.
pub struct Wallet {
    root: RootModel,
}

impl Model for Wallet {
    fn schema() -> Arc<DocumentSchema> {
        static SCHEMA: OnceLock<Arc<DocumentSchema>> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                let shape = ObjectShape::builder()
                    .field("_id", Shape::object_id())
                    .field("owner", Shape::string())
                    .field("coins", Shape::int64())
                    .field("history", Shape::array(Shape::int64()))
                    .field("opened", Shape::datetime())
                    .field("balance", Shape::decimal128().nullable())
                    .field("seal", Shape::binary().nullable())
                    .build()
                    .expect("wallet shape");
                Arc::new(DocumentSchema::new(shape).expect("wallet schema"))
            })
            .clone()
    }

    fn from_root(root: RootModel) -> Self {
        Self { root }
    }

    fn root(&self) -> &RootModel {
        &self.root
    }

    fn root_mut(&mut self) -> &mut RootModel {
        &mut self.root
    }
}

/// `_id` plus a string-keyed map, for key validation cases.
pub fn labeled_schema() -> Arc<DocumentSchema> {
    let shape = ObjectShape::builder()
        .field("_id", Shape::string())
        .field("labels", Shape::map(MapKey::String, Shape::int32()))
        .build()
        .expect("labeled shape");
    Arc::new(DocumentSchema::new(shape).expect("labeled schema"))
}

pub fn base_player_json() -> Value {
    serde_json::json!({
        "_id": "k1",
        "name": "a",
        "age": 1,
        "nickname": "n",
        "wallet": { "coins": 100, "gems": 0 },
        "equipment": { "slots": ["head"], "weight": 2.5 },
        "tags": ["x", "y"],
        "scores": { "1": 10 },
        "inventory": [{ "name": "sword", "qty": 1 }]
    })
}

pub fn player_from_json(value: &Value) -> Player {
    let generic = GenericValue::from(value.clone());
    let root = RootModel::from_generic(Player::schema(), &generic, &StandardCodec::default())
        .expect("decode player");
    Player::from_root(root)
}

pub fn base_player() -> Player {
    player_from_json(&base_player_json())
}

pub fn to_json(root: &RootModel) -> Value {
    Value::from(root.to_generic(&StandardCodec::default()))
}

/// Serialized form; unlike `Value` equality this is sensitive to key order.
pub fn ordered(value: &Value) -> String {
    value.to_string()
}

pub fn update_json(doc: &UpdateDocument) -> Value {
    Value::from(doc.to_generic())
}

/// Applies `$set` / `$unset` / `$push` operators to a JSON document the way
/// the database would: `$set` keeps an existing key in place and appends a
/// new one, `$unset` leaves the other keys in order.
pub fn apply_update(doc: &mut Value, update: &Value) {
    if let Some(set) = update.get("$set").and_then(Value::as_object) {
        for (path, value) in set {
            let (parent, last) = split(path);
            let target = navigate(doc, &parent);
            match target {
                Value::Array(items) => {
                    let index: usize = last.parse().expect("array index");
                    items[index] = value.clone();
                }
                Value::Object(map) => {
                    map.insert(last.to_owned(), value.clone());
                }
                other => panic!("cannot $set inside {other}"),
            }
        }
    }
    if let Some(unset) = update.get("$unset").and_then(Value::as_object) {
        for path in unset.keys() {
            let (parent, last) = split(path);
            if let Value::Object(map) = navigate(doc, &parent) {
                *map = std::mem::take(map)
                    .into_iter()
                    .filter(|(k, _)| k != last)
                    .collect();
            }
        }
    }
    if let Some(push) = update.get("$push").and_then(Value::as_object) {
        for (path, modifier) in push {
            let each = modifier
                .get("$each")
                .and_then(Value::as_array)
                .expect("$push uses $each");
            let segments: Vec<&str> = path.split('.').collect();
            match navigate(doc, &segments) {
                Value::Array(items) => items.extend(each.iter().cloned()),
                other => panic!("cannot $push into {other}"),
            }
        }
    }
}

fn split(path: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop().expect("non-empty path");
    (segments, last)
}

fn navigate<'v>(doc: &'v mut Value, segments: &[&str]) -> &'v mut Value {
    segments.iter().fold(doc, |cur, seg| match cur {
        Value::Array(items) => {
            let index: usize = seg.parse().expect("array index");
            &mut items[index]
        }
        Value::Object(map) => map.get_mut(*seg).expect("existing field"),
        other => panic!("cannot descend into {other}"),
    })
}
