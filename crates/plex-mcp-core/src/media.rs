//! Media type enum shared by search and metadata filters.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Kind of media item on the Plex server.
///
/// The numeric codes match the `type` parameter of the Plex HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Feature film
    Movie,
    /// TV show
    Show,
    /// TV season
    Season,
    /// TV episode
    Episode,
    /// Music artist
    Artist,
    /// Music album
    Album,
    /// Music track
    Track,
    /// Photo
    Photo,
}

impl MediaType {
    /// Numeric type code used by the Plex API (`?type=`).
    pub fn code(self) -> u32 {
        match self {
            MediaType::Movie => 1,
            MediaType::Show => 2,
            MediaType::Season => 3,
            MediaType::Episode => 4,
            MediaType::Artist => 8,
            MediaType::Album => 9,
            MediaType::Track => 10,
            MediaType::Photo => 13,
        }
    }

    /// Lowercase name as used in Plex API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Show => "show",
            MediaType::Season => "season",
            MediaType::Episode => "episode",
            MediaType::Artist => "artist",
            MediaType::Album => "album",
            MediaType::Track => "track",
            MediaType::Photo => "photo",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "show" => Ok(MediaType::Show),
            "season" => Ok(MediaType::Season),
            "episode" => Ok(MediaType::Episode),
            "artist" => Ok(MediaType::Artist),
            "album" => Ok(MediaType::Album),
            "track" => Ok(MediaType::Track),
            "photo" => Ok(MediaType::Photo),
            other => Err(Error::InvalidInput(format!(
                "unknown media type '{other}' (expected movie, show, season, episode, artist, album, track or photo)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(MediaType::Movie.code(), 1);
        assert_eq!(MediaType::Show.code(), 2);
        assert_eq!(MediaType::Episode.code(), 4);
        assert_eq!(MediaType::Track.code(), 10);
    }

    #[test]
    fn test_parse() {
        assert_eq!("movie".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert_eq!("Episode".parse::<MediaType>().unwrap(), MediaType::Episode);
        assert!("podcast".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_roundtrip_display() {
        for t in [
            MediaType::Movie,
            MediaType::Show,
            MediaType::Season,
            MediaType::Episode,
            MediaType::Artist,
            MediaType::Album,
            MediaType::Track,
            MediaType::Photo,
        ] {
            assert_eq!(t.to_string().parse::<MediaType>().unwrap(), t);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&MediaType::Show).unwrap();
        assert_eq!(json, "\"show\"");
        let back: MediaType = serde_json::from_str("\"album\"").unwrap();
        assert_eq!(back, MediaType::Album);
    }
}
