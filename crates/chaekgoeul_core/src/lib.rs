pub mod domain;
pub mod ports;
pub mod recent;
pub mod token;

pub use domain::{
    ApplicationStatus, Book, BookApplication, BookId, Credentials, Difficulty, LikedBooks,
    QuizAnswer, QuizGrade, QuizQuestion, QuizRequest, QuizResult, QuizType, Scene, UserProfile,
};
pub use ports::{
    ApplicationApi, AuthApi, BookApi, Clock, KeyValueStore, PortError, PortResult, QuizApi,
    SummaryApi, SystemClock,
};
pub use recent::{RecentSearches, MAX_RECENT_SEARCHES};
pub use token::{evaluate, Claims, TokenStatus};
