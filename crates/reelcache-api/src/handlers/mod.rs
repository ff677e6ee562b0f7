pub mod health;
pub mod reels;
