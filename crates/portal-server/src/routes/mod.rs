pub mod broadcast;
pub mod chat;
pub mod claims;
pub mod curriculum;
pub mod fallback;
pub mod health;
pub mod mastery;
pub mod raffles;
pub mod session;
pub mod users;
pub mod xp;
