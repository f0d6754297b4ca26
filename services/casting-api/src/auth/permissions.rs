//! Permission strings granted by the identity provider.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    GetMovies,
    PostMovies,
    PatchMovies,
    DeleteMovies,
    GetActors,
    PostActors,
    PatchActors,
    DeleteActors,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::GetMovies => "get:movies",
            Permission::PostMovies => "post:movies",
            Permission::PatchMovies => "patch:movies",
            Permission::DeleteMovies => "delete:movies",
            Permission::GetActors => "get:actors",
            Permission::PostActors => "post:actors",
            Permission::PatchActors => "patch:actors",
            Permission::DeleteActors => "delete:actors",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: [Permission; 8] = [
        Permission::GetMovies,
        Permission::PostMovies,
        Permission::PatchMovies,
        Permission::DeleteMovies,
        Permission::GetActors,
        Permission::PostActors,
        Permission::PatchActors,
        Permission::DeleteActors,
    ];

    #[test]
    fn permission_strings_match_display() {
        for permission in ALL {
            assert_eq!(permission.to_string(), permission.as_str());
        }
        assert_eq!(Permission::PatchActors.as_str(), "patch:actors");
    }

    #[test]
    fn permission_strings_are_distinct() {
        let strings: HashSet<&str> = ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(strings.len(), ALL.len());
    }
}
