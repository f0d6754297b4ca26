use super::{MAX_TEXT_LEN, ValidationError, required, text};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_GENDER_LEN: usize = 20;
pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 149;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ActorCreateRequest {
    #[schema(example = "Tom Hanks")]
    pub name: Option<String>,
    #[schema(example = 67)]
    pub age: Option<i64>,
    #[schema(example = "Male")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ActorPatchRequest {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActor {
    pub name: String,
    pub age: i32,
    pub gender: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorPatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

fn age(value: i64) -> Result<i32, ValidationError> {
    if !(MIN_AGE..=MAX_AGE).contains(&value) {
        return Err(ValidationError::new(
            "age",
            format!("Must be greater than or equal to {MIN_AGE} and less than or equal to {MAX_AGE}."),
        ));
    }
    // Range check above keeps this lossless.
    Ok(value as i32)
}

impl ActorCreateRequest {
    pub fn validate(self) -> Result<NewActor, ValidationError> {
        Ok(NewActor {
            name: text("name", required("name", self.name)?, MAX_TEXT_LEN)?,
            age: age(required("age", self.age)?)?,
            gender: text("gender", required("gender", self.gender)?, MAX_GENDER_LEN)?,
        })
    }
}

impl ActorPatchRequest {
    pub fn validate(self) -> Result<ActorPatch, ValidationError> {
        Ok(ActorPatch {
            name: self
                .name
                .map(|name| text("name", name, MAX_TEXT_LEN))
                .transpose()?,
            age: self.age.map(age).transpose()?,
            gender: self
                .gender
                .map(|gender| text("gender", gender, MAX_GENDER_LEN))
                .transpose()?,
        })
    }
}

impl ActorPatch {
    pub fn apply(self, actor: &mut Actor) {
        if let Some(name) = self.name {
            actor.name = name;
        }
        if let Some(age) = self.age {
            actor.age = age;
        }
        if let Some(gender) = self.gender {
            actor.gender = gender;
        }
    }
}
