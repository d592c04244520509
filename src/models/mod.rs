pub mod classification;
pub mod colors;
pub mod export;
pub mod page;
pub mod rich_text;
pub mod table;
