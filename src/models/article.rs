//! Article model
//!
//! This module provides:
//! - `Article` entity representing a submitted story
//! - `Category` enum for the fixed set of story categories
//! - Input types for creating articles
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted title length in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum accepted content length in characters
pub const MAX_CONTENT_LEN: usize = 20_000;

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Article title
    pub title: String,
    /// Plain text content
    pub content: String,
    /// Story category
    pub category: Category,
    /// Display name shown as the author (defaults to "Anonymous")
    pub author_name: String,
    /// Submitting user ID, if the author was logged in
    pub author_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// View count
    #[serde(default)]
    pub views_count: i64,
    /// Like count
    #[serde(default)]
    pub likes_count: i64,
    /// Comment count
    #[serde(default)]
    pub comments_count: i64,
}

impl Article {
    /// Create a new article with zeroed counters
    pub fn new(
        title: String,
        content: String,
        category: Category,
        author_name: String,
        author_id: Option<i64>,
    ) -> Self {
        Self {
            id: 0, // Will be set by database
            title,
            content,
            category,
            author_name,
            author_id,
            created_at: Utc::now(),
            views_count: 0,
            likes_count: 0,
            comments_count: 0,
        }
    }
}

/// Story category
///
/// The category set is closed: values outside it are rejected at the
/// boundary and never reach storage. "All" is a filter concept in list
/// queries, not a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Campus Life")]
    CampusLife,
    #[serde(rename = "Pranks & Fun")]
    PranksAndFun,
    #[serde(rename = "Love Stories")]
    LoveStories,
    #[serde(rename = "Achievements")]
    Achievements,
    #[serde(rename = "Study Tips")]
    StudyTips,
    #[serde(rename = "Breaking News")]
    BreakingNews,
}

impl Category {
    /// All categories, in display order
    pub const ALL: [Category; 6] = [
        Category::CampusLife,
        Category::PranksAndFun,
        Category::LoveStories,
        Category::Achievements,
        Category::StudyTips,
        Category::BreakingNews,
    ];

    /// Convert category to its canonical display/storage string
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CampusLife => "Campus Life",
            Category::PranksAndFun => "Pranks & Fun",
            Category::LoveStories => "Love Stories",
            Category::Achievements => "Achievements",
            Category::StudyTips => "Study Tips",
            Category::BreakingNews => "Breaking News",
        }
    }

    /// Parse category from its storage string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Campus Life" => Some(Category::CampusLife),
            "Pranks & Fun" => Some(Category::PranksAndFun),
            "Love Stories" => Some(Category::LoveStories),
            "Achievements" => Some(Category::Achievements),
            "Study Tips" => Some(Category::StudyTips),
            "Breaking News" => Some(Category::BreakingNews),
            _ => None,
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s).ok_or_else(|| format!("Unknown category: '{}'", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new article
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticleInput {
    /// Article title
    pub title: String,
    /// Plain text content
    pub content: String,
    /// Category name (must parse to a `Category`)
    pub category: String,
    /// Optional display name; blank falls back to "Anonymous"
    #[serde(default)]
    pub author_name: Option<String>,
}

impl CreateArticleInput {
    /// Validate the input and resolve the category
    ///
    /// Rejects missing title/content and unknown categories before any
    /// write is attempted.
    pub fn validate(&self) -> Result<Category, String> {
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(format!("Title exceeds {} characters", MAX_TITLE_LEN));
        }
        if self.content.trim().is_empty() {
            return Err("Content cannot be empty".to_string());
        }
        if self.content.chars().count() > MAX_CONTENT_LEN {
            return Err(format!("Content exceeds {} characters", MAX_CONTENT_LEN));
        }
        Category::parse(self.category.trim())
            .ok_or_else(|| format!("Unknown category: '{}'", self.category))
    }

    /// Resolve the display author name
    pub fn display_author(&self) -> String {
        match self.author_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => "Anonymous".to_string(),
        }
    }
}

/// Parameters for listing articles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
    /// Restrict to one category; `None` means all
    pub category: Option<Category>,
}

impl Default for ArticleListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            category: None,
        }
    }
}

impl ArticleListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
            category: None,
        }
    }

    /// Restrict the listing to a category
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Calculate the offset for database queries.
    /// Computed in i64 so extreme page numbers cannot overflow.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.per_page)
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ArticleListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for cat in Category::ALL {
            assert_eq!(Category::parse(cat.as_str()), Some(cat));
        }
    }

    #[test]
    fn test_category_rejects_unknown() {
        assert_eq!(Category::parse("Sports"), None);
        assert_eq!(Category::parse(""), None);
        assert_eq!(Category::parse("All"), None);
        // Parsing is exact, not case-insensitive
        assert_eq!(Category::parse("campus life"), None);
    }

    #[test]
    fn test_category_serde_uses_display_names() {
        let json = serde_json::to_string(&Category::PranksAndFun).unwrap();
        assert_eq!(json, "\"Pranks & Fun\"");

        let parsed: Category = serde_json::from_str("\"Breaking News\"").unwrap();
        assert_eq!(parsed, Category::BreakingNews);
    }

    #[test]
    fn test_create_input_validation() {
        let input = CreateArticleInput {
            title: "Prank Day".to_string(),
            content: "Someone filled the lecture hall with balloons".to_string(),
            category: "Pranks & Fun".to_string(),
            author_name: None,
        };
        assert_eq!(input.validate(), Ok(Category::PranksAndFun));
        assert_eq!(input.display_author(), "Anonymous");
    }

    #[test]
    fn test_create_input_rejects_missing_fields() {
        let mut input = CreateArticleInput {
            title: "".to_string(),
            content: "body".to_string(),
            category: "Campus Life".to_string(),
            author_name: None,
        };
        assert!(input.validate().is_err());

        input.title = "t".to_string();
        input.content = "   ".to_string();
        assert!(input.validate().is_err());

        input.content = "body".to_string();
        input.category = "Nonsense".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_input_rejects_over_length() {
        let input = CreateArticleInput {
            title: "x".repeat(MAX_TITLE_LEN + 1),
            content: "body".to_string(),
            category: "Campus Life".to_string(),
            author_name: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_display_author_trims_blank() {
        let input = CreateArticleInput {
            title: "t".to_string(),
            content: "c".to_string(),
            category: "Achievements".to_string(),
            author_name: Some("   ".to_string()),
        };
        assert_eq!(input.display_author(), "Anonymous");

        let named = CreateArticleInput {
            author_name: Some("  Sam  ".to_string()),
            ..input
        };
        assert_eq!(named.display_author(), "Sam");
    }

    #[test]
    fn test_list_params_clamping() {
        let params = ArticleListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(params.offset(), 0);

        let params = ArticleListParams::new(3, 10);
        assert_eq!(params.offset(), 20);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_list_params_offset_at_max_page() {
        let params = ArticleListParams::new(u32::MAX, 100);
        assert_eq!(params.offset(), (i64::from(u32::MAX) - 1) * 100);
    }

    #[test]
    fn test_paged_result_math() {
        let params = ArticleListParams::new(2, 10);
        let result: PagedResult<i32> = PagedResult::new(vec![1, 2, 3], 25, &params);

        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());
        assert!(result.has_prev());
        assert_eq!(result.len(), 3);
    }
}
