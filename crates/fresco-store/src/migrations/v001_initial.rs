//! v001 -- Initial schema creation.
//!
//! Creates the six core tables: `users`, `sessions`, `follows`, `posts`,
//! `comments`, and `likes`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name            TEXT NOT NULL,
    username        TEXT NOT NULL UNIQUE,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,               -- argon2id PHC string
    profile_picture TEXT,                        -- relative path, e.g. profile/...
    created_at      TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Sessions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY NOT NULL,        -- 32 random bytes, hex
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);

-- ----------------------------------------------------------------
-- Follow graph (directed edges: follower -> followed)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS follows (
    follower_id TEXT NOT NULL,
    followed_id TEXT NOT NULL,
    created_at  TEXT NOT NULL,

    PRIMARY KEY (follower_id, followed_id),
    FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (followed_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id);
CREATE INDEX IF NOT EXISTS idx_follows_followed ON follows(followed_id);

-- ----------------------------------------------------------------
-- Posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id         TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    user_id    TEXT NOT NULL,
    image_path TEXT NOT NULL,                    -- relative path, e.g. posts/...
    caption    TEXT,
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id);
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);

-- ----------------------------------------------------------------
-- Comments (parent_id marks a one-level reply to a top-level comment)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    user_id    TEXT NOT NULL,
    post_id    TEXT NOT NULL,
    parent_id  TEXT,                             -- nullable FK -> comments(id)
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id)   REFERENCES users(id)    ON DELETE CASCADE,
    FOREIGN KEY (post_id)   REFERENCES posts(id)    ON DELETE CASCADE,
    FOREIGN KEY (parent_id) REFERENCES comments(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post_parent ON comments(post_id, parent_id);

-- ----------------------------------------------------------------
-- Likes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS likes (
    user_id    TEXT NOT NULL,
    post_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    PRIMARY KEY (user_id, post_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_likes_post_id ON likes(post_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
