//! Page sizes of the paginated listings.

pub const ORGANIZATIONS_PAGE_SIZE: u64 = 5;
pub const ORGANIZATION_QUIZZES_PAGE_SIZE: u64 = 5;
pub const POSTS_PAGE_SIZE: u64 = 5;
pub const MEMBERS_PAGE_SIZE: u64 = 50;
pub const COMMENTS_PAGE_SIZE: u64 = 50;
pub const QUIZZES_PAGE_SIZE: u64 = 5;
pub const ANSWERS_PAGE_SIZE: u64 = 40;
pub const STANDINGS_PAGE_SIZE: u64 = 40;
pub const ARCHIVE_PAGE_SIZE: u64 = 40;
pub const RESULTS_PAGE_SIZE: u64 = 40;
