//! Server-side HTML for the landing page and the dashboard.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::genres::GenreCount;
use crate::mood::Mood;
use crate::session::SongTag;
use crate::spotify::{Artist, SearchKind, Track};

pub const APP_NAME: &str = "PiMusic";

/// Mood buttons shown on the dashboard, with their captions.
const MOOD_BUTTONS: [(Mood, &str); 6] = [
    (Mood::Energetic, "Energetic"),
    (Mood::Calm, "Calm"),
    (Mood::Happy, "Happy"),
    (Mood::Melancholic, "Melancholic"),
    (Mood::ConquerTheWorld, "Conquer the world"),
    (Mood::Random, "Surprise me"),
];

/// Everything the dashboard page can show. Sections without data render placeholders.
#[derive(Default)]
pub struct DashboardView {
    pub title: String,
    pub top_artists: Vec<Artist>,
    pub genres: Vec<GenreCount>,
    pub playlist: Option<PlaylistView>,
    pub search: Option<SearchView>,
    pub tags: BTreeMap<String, SongTag>,
}

pub struct PlaylistView {
    pub mood: Mood,
    pub tracks: Vec<Track>,
}

pub struct SearchView {
    pub query: String,
    pub kind: SearchKind,
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
}

/// Minimal escaping for text and double-quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn layout(title: &str, body: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link href="https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css" rel="stylesheet">
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
</head>
<body class="bg-gray-50 font-sans text-gray-800">
    <div class="container mx-auto px-4 py-10">
        <header class="text-center mb-10">
            <h1 class="text-4xl md:text-5xl font-extrabold text-gray-900 mb-2">{app}</h1>
            <p class="text-lg md:text-xl text-gray-600">Your everyday music companion.</p>
        </header>
{body}
    </div>
{script}
</body>
</html>
"#,
        title = escape(title),
        app = APP_NAME,
    )
}

pub fn landing() -> String {
    let body = r#"        <div class="bg-white p-6 rounded-lg shadow-lg mb-8 text-center max-w-lg mx-auto">
            <h2 class="text-2xl font-semibold mb-4">Welcome to PiMusic</h2>
            <p class="mb-6 text-gray-600">Log in with your Spotify account to get started.</p>
            <a href="/login" class="bg-green-500 hover:bg-green-700 text-white font-bold py-2 px-4 rounded-full inline-block">Log in with Spotify</a>
        </div>"#;
    layout(APP_NAME, body, "")
}

pub fn dashboard(view: &DashboardView) -> String {
    let mut body = String::new();

    body.push_str(
        r#"        <nav class="flex justify-between items-center mb-8 bg-white p-4 rounded-lg shadow-sm">
            <a href="/dashboard" class="text-blue-500 hover:underline">Dashboard</a>
            <a href="/logout" class="text-red-500 hover:underline">Log out</a>
        </nav>
"#,
    );
    habits_section(&mut body, view);
    playlist_section(&mut body, view.playlist.as_ref());
    search_section(&mut body, view.search.as_ref());
    tags_section(&mut body, &view.tags);

    layout(&view.title, &body, &genre_chart_script(&view.genres))
}

fn section_open(out: &mut String, heading: &str) {
    let _ = write!(
        out,
        r#"        <div class="bg-white p-6 rounded-lg shadow-lg mb-8">
            <h2 class="text-2xl font-semibold mb-4 text-green-700">{}</h2>
"#,
        escape(heading)
    );
}

fn section_close(out: &mut String) {
    out.push_str("        </div>\n");
}

fn habits_section(out: &mut String, view: &DashboardView) {
    section_open(out, "Your listening habits");
    if view.top_artists.is_empty() {
        out.push_str(r#"            <p class="text-gray-500">No data found for your top artists.</p>
"#);
    } else {
        out.push_str(r#"            <div class="grid md:grid-cols-2 gap-8">
                <div>
                    <h3 class="font-semibold mb-2 text-lg">Top 10 artists</h3>
                    <ul class="list-disc list-inside space-y-1">
"#);
        for artist in &view.top_artists {
            let _ = writeln!(out, "                        <li>{}</li>", escape(&artist.name));
        }
        out.push_str(r#"                    </ul>
                </div>
                <div>
                    <h3 class="font-semibold mb-2 text-lg">Top genres</h3>
                    <canvas id="genreChart" class="max-w-xs mx-auto"></canvas>
                </div>
            </div>
"#);
    }
    section_close(out);
}

fn playlist_section(out: &mut String, playlist: Option<&PlaylistView>) {
    section_open(out, "Mood playlist");
    out.push_str(r#"            <div class="flex flex-wrap gap-2 mb-6">
"#);
    for (mood, caption) in MOOD_BUTTONS {
        let _ = writeln!(
            out,
            r#"                <a href="/playlist?mood={}" class="bg-green-500 text-white font-bold py-2 px-4 rounded-full">{}</a>"#,
            urlencoding::encode(mood.label()),
            escape(caption),
        );
    }
    out.push_str("            </div>\n");

    if let Some(playlist) = playlist {
        let _ = writeln!(
            out,
            r#"            <h3 class="text-lg font-semibold mb-2">Playlist {}</h3>"#,
            escape(&capitalize(playlist.mood.label()))
        );
        if playlist.tracks.is_empty() {
            out.push_str(r#"            <p class="text-gray-500">No recommendations available right now.</p>
"#);
        } else {
            out.push_str(r#"            <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4">
"#);
            for track in &playlist.tracks {
                let _ = write!(
                    out,
                    r#"                <div class="bg-gray-100 p-4 rounded-lg shadow-sm mb-4">
                    <p class="font-bold">{name}</p>
                    <p class="text-sm text-gray-500">{artist}</p>
                    <form action="/tag_song" method="post" class="mt-2">
                        <input type="hidden" name="song_id" value="{id}">
                        <input type="hidden" name="song_name" value="{name}">
                        <input type="text" name="tag" placeholder="Tag this song" class="border rounded w-full py-2 px-3 text-xs">
                        <button type="submit" class="bg-blue-500 text-white text-xs font-bold py-1 px-2 rounded-full mt-2">Tag</button>
                    </form>
                </div>
"#,
                    name = escape(&track.name),
                    artist = escape(track.primary_artist().unwrap_or("Unknown artist")),
                    id = escape(&track.id),
                );
            }
            out.push_str("            </div>\n");
        }
    }
    section_close(out);
}

fn search_section(out: &mut String, search: Option<&SearchView>) {
    section_open(out, "Discover music");
    let _ = write!(
        out,
        r#"            <form action="/search" method="post" class="flex flex-col md:flex-row gap-4 mb-6">
                <input type="text" name="query" value="{query}" placeholder="Search for an artist or song..." class="border rounded flex-grow py-2 px-3">
                <select name="type" class="border rounded py-2 px-3">
                    <option value="artist"{artist_selected}>Artist</option>
                    <option value="track"{track_selected}>Song</option>
                </select>
                <button type="submit" class="bg-green-500 text-white font-bold py-2 px-4 rounded-full">Search</button>
            </form>
"#,
        query = search.map(|s| escape(&s.query)).unwrap_or_default(),
        artist_selected = match search.map(|s| s.kind) {
            Some(SearchKind::Track) => "",
            _ => " selected",
        },
        track_selected = match search.map(|s| s.kind) {
            Some(SearchKind::Track) => " selected",
            _ => "",
        },
    );

    if let Some(search) = search {
        let query = escape(&search.query);
        if !search.artists.is_empty() {
            let _ = writeln!(
                out,
                r#"            <h3 class="text-lg font-semibold mb-2">Results for '{query}' (artists)</h3>"#
            );
            out.push_str(r#"            <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4">
"#);
            for artist in &search.artists {
                let genres = if artist.genres.is_empty() {
                    "N/A".to_string()
                } else {
                    artist.genres.join(", ")
                };
                let _ = write!(
                    out,
                    r#"                <div class="bg-gray-100 p-4 rounded-lg shadow-sm mb-4">
                    <p class="font-bold"><a href="https://open.spotify.com/artist/{}" class="hover:underline">{}</a></p>
                    <p class="text-sm text-gray-500">Genres: {}</p>
                </div>
"#,
                    urlencoding::encode(&artist.id),
                    escape(&artist.name),
                    escape(&genres),
                );
            }
            out.push_str("            </div>\n");
        } else if !search.tracks.is_empty() {
            let _ = writeln!(
                out,
                r#"            <h3 class="text-lg font-semibold mb-2">Results for '{query}' (songs)</h3>"#
            );
            out.push_str(r#"            <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4">
"#);
            for track in &search.tracks {
                let _ = write!(
                    out,
                    r#"                <div class="bg-gray-100 p-4 rounded-lg shadow-sm mb-4">
                    <p class="font-bold">{}</p>
                    <p class="text-sm text-gray-500">Artist: {}</p>
                </div>
"#,
                    escape(&track.name),
                    escape(track.primary_artist().unwrap_or("Unknown artist")),
                );
            }
            out.push_str("            </div>\n");
        } else {
            let _ = writeln!(
                out,
                r#"            <p class="text-gray-500">No results for '{query}'.</p>"#
            );
        }
    }
    section_close(out);
}

fn tags_section(out: &mut String, tags: &BTreeMap<String, SongTag>) {
    section_open(out, "Your tagged songs");
    if tags.is_empty() {
        out.push_str(r#"            <p class="text-gray-500">You have not tagged any songs yet.</p>
"#);
    } else {
        out.push_str(r#"            <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4">
"#);
        for tag in tags.values() {
            let _ = write!(
                out,
                r#"                <div class="bg-gray-100 p-4 rounded-lg shadow-sm mb-4">
                    <p class="font-bold"><a href="https://open.spotify.com/track/{}" class="hover:underline">{}</a></p>
                    <p class="text-sm text-gray-500">Tag: <span class="font-semibold text-blue-600">{}</span></p>
                </div>
"#,
                urlencoding::encode(&tag.song_id),
                escape(if tag.name.is_empty() { &tag.song_id } else { &tag.name }),
                escape(&tag.tag),
            );
        }
        out.push_str("            </div>\n");
    }
    section_close(out);
}

/// Doughnut chart bootstrap, or nothing when there are no genres.
fn genre_chart_script(genres: &[GenreCount]) -> String {
    if genres.is_empty() {
        return String::new();
    }
    let labels: Vec<&str> = genres.iter().map(|g| g.label.as_str()).collect();
    let counts: Vec<u32> = genres.iter().map(|g| g.count).collect();
    // "</" would end the script element early.
    let labels = serde_json::to_string(&labels).unwrap_or_default().replace("</", "<\\/");
    let counts = serde_json::to_string(&counts).unwrap_or_default();

    format!(
        r#"    <script>
        new Chart(document.getElementById('genreChart'), {{
            type: 'doughnut',
            data: {{
                labels: {labels},
                datasets: [{{
                    data: {counts},
                    backgroundColor: [
                        'rgba(255, 99, 132, 0.8)',
                        'rgba(54, 162, 235, 0.8)',
                        'rgba(255, 206, 86, 0.8)',
                        'rgba(75, 192, 192, 0.8)',
                        'rgba(153, 102, 255, 0.8)',
                        'rgba(255, 159, 64, 0.8)'
                    ],
                }}]
            }},
            options: {{
                responsive: true,
                plugins: {{ legend: {{ position: 'bottom' }} }}
            }}
        }});
    </script>"#
    )
}
