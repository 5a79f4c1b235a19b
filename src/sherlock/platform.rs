use std::fmt;

/// Social platforms the `sherlock` command looks a name up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    GitHub,
    GitLab,
    Instagram,
    Reddit,
    Snapchat,
    Spotify,
    Pinterest,
    Tumblr,
    Twitter,
    LastFm,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Platform::GitHub,
        Platform::GitLab,
        Platform::Instagram,
        Platform::Reddit,
        Platform::Snapchat,
        Platform::Spotify,
        Platform::Pinterest,
        Platform::Tumblr,
        Platform::Twitter,
        Platform::LastFm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::GitHub => "GitHub",
            Platform::GitLab => "GitLab",
            Platform::Instagram => "Instagram",
            Platform::Reddit => "Reddit",
            Platform::Snapchat => "Snapchat",
            Platform::Spotify => "Spotify",
            Platform::Pinterest => "Pinterest",
            Platform::Tumblr => "Tumblr",
            Platform::Twitter => "Twitter",
            Platform::LastFm => "Last.fm",
        }
    }

    /// Public profile page for `username`
    pub fn profile_url(&self, username: &str) -> String {
        match self {
            Platform::GitHub => format!("https://github.com/{}", username),
            Platform::GitLab => format!("https://gitlab.com/{}", username),
            Platform::Instagram => format!("https://www.instagram.com/{}/", username),
            Platform::Reddit => format!("https://www.reddit.com/user/{}", username),
            Platform::Snapchat => format!("https://www.snapchat.com/add/{}", username),
            Platform::Spotify => format!("https://open.spotify.com/user/{}", username),
            Platform::Pinterest => format!("https://www.pinterest.com/{}/", username),
            Platform::Tumblr => format!("https://{}.tumblr.com", username),
            Platform::Twitter => format!("https://x.com/{}", username),
            Platform::LastFm => format!("https://www.last.fm/user/{}", username),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
