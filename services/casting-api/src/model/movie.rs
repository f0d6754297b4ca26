use super::{MAX_TEXT_LEN, ValidationError, required, text, timestamp};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MovieCreateRequest {
    #[schema(example = "Forrest Gump")]
    pub title: Option<String>,
    #[schema(example = "1994-07-06T00:00:00")]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MoviePatchRequest {
    pub title: Option<String>,
    pub release_date: Option<String>,
}

/// A validated movie ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: NaiveDateTime,
}

/// Validated partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub release_date: Option<NaiveDateTime>,
}

impl MovieCreateRequest {
    pub fn validate(self) -> Result<NewMovie, ValidationError> {
        let title = text("title", required("title", self.title)?, MAX_TEXT_LEN)?;
        let release_date = required("release_date", self.release_date)?;
        Ok(NewMovie {
            title,
            release_date: timestamp("release_date", &release_date)?,
        })
    }
}

impl MoviePatchRequest {
    pub fn validate(self) -> Result<MoviePatch, ValidationError> {
        Ok(MoviePatch {
            title: self
                .title
                .map(|title| text("title", title, MAX_TEXT_LEN))
                .transpose()?,
            release_date: self
                .release_date
                .map(|value| timestamp("release_date", &value))
                .transpose()?,
        })
    }
}

impl MoviePatch {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(release_date) = self.release_date {
            movie.release_date = release_date;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_title_and_release_date() {
        let err = MovieCreateRequest {
            title: None,
            release_date: Some("1994-07-06".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "title");

        let err = MovieCreateRequest {
            title: Some("Heat".into()),
            release_date: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "release_date");
    }

    #[test]
    fn create_validates_values() {
        let movie = MovieCreateRequest {
            title: Some(" Forrest Gump ".into()),
            release_date: Some("1994-07-06T00:00:00".into()),
        }
        .validate()
        .expect("valid");
        assert_eq!(movie.title, "Forrest Gump");
        assert_eq!(movie.release_date.to_string(), "1994-07-06 00:00:00");
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let created = NaiveDateTime::parse_from_str("2024-01-01T00:00:00", "%Y-%m-%dT%H:%M:%S")
            .expect("ts");
        let mut movie = Movie {
            id: 1,
            title: "Heat".into(),
            release_date: created,
            created_at: created,
        };
        MoviePatchRequest {
            title: Some("Heat (1995)".into()),
            release_date: None,
        }
        .validate()
        .expect("valid")
        .apply(&mut movie);
        assert_eq!(movie.title, "Heat (1995)");
        assert_eq!(movie.release_date, created);
    }

    #[test]
    fn patch_rejects_empty_title() {
        let err = MoviePatchRequest {
            title: Some(String::new()),
            release_date: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, "title");
    }
}
