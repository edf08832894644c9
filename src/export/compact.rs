//! Compact BBCode narrative
//!
//! A stream summary taken from the first track, then one list item per
//! track with cuesheet and spectrogram markers.

use crate::types::{AlbumRecord, TrackRecord};

const LEGEND: &str = ":cd:: indicates the track contains an embedded cuesheet.\n\
                      :bar_chart:: indicates the track has a spectrogram for it, click the icon to view.\n";

/// Render an album as the compact narrative
pub fn render(album: &AlbumRecord) -> String {
    let mut out = summary(album.first());
    out.push_str("[list=1]");

    for (_, track) in album.iter() {
        out.push_str("[*]");
        if track.embedded_cuesheet {
            out.push_str(":cd:");
        }
        if let Some(url) = track.spectrogram.url() {
            out.push_str(&format!(" [url={}]:bar_chart:[/url]", url));
        }
        out.push_str(&format!(
            "{} - {} / {} / {} / {}\n",
            track.artist, track.title, track.duration, track.bitrate, track.audio_md5
        ));
    }

    out.push_str("[/list]\n\n");
    out.push_str(LEGEND);
    out
}

fn summary(first: Option<&TrackRecord>) -> String {
    let (codec, channels, bits, rate) = match first {
        Some(t) => (
            t.codec.clone(),
            t.channels.to_string(),
            t.bits_per_sample.to_string(),
            t.sample_rate.clone(),
        ),
        None => {
            let unknown = || TrackRecord::UNKNOWN.to_string();
            (unknown(), unknown(), unknown(), unknown())
        }
    };

    format!(
        "[size=22][b][/b][/size]\n[size=16]{} / {} ch / {} bit / {}[/size]\n\n",
        codec, channels, bits, rate
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::table::tests::{album, record};

    #[test]
    fn test_summary_from_first_track() {
        let out = render(&album());
        assert!(out.starts_with("[size=22][b][/b][/size]\n[size=16]FLAC / 2 ch / 16 bit / 44.1 kHz[/size]\n\n[list=1]"));
    }

    #[test]
    fn test_items_and_markers() {
        let out = render(&album());
        assert!(out.contains(
            "[list=1][*]Artist - One / 00:03:05 / 912 kbps / d41d8cd98f00b204e9800998ecf8427e\n"
        ));
        assert!(out.contains("[*] [url=https://img/2.png]:bar_chart:[/url]Artist - Two /"));
        assert!(out.ends_with(&format!("[/list]\n\n{}", LEGEND)));
    }

    #[test]
    fn test_cuesheet_marker() {
        let mut album = AlbumRecord::new("/x");
        let mut track = record("1", "Cued");
        track.embedded_cuesheet = true;
        album.insert("01.flac", track);
        assert!(render(&album).contains("[*]:cd:Artist - Cued"));
    }

    #[test]
    fn test_empty_album() {
        let out = render(&AlbumRecord::new("/x"));
        assert!(out.contains("[size=16]Unknown / Unknown ch / Unknown bit / Unknown[/size]"));
        assert!(out.contains("[list=1][/list]"));
    }
}
