mod blend;
mod film;
mod user;

pub use blend::{BlendResult, BlendStats, CommonFilm, RecommendedFilm, Recommendations};
pub use film::{normalize_title, parse_rating, FilmKey, FilmRecord, UserDataset};
pub use user::Username;
