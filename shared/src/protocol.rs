//! Line-oriented wire protocol shared by server and client.
//!
//! A transmission is one UTF-8 text line. A line carries one or more events
//! separated by `;`, each of the form `tag:field,field,...`. Decoding is
//! per-event: a malformed payload rejects only that event, and unknown tags
//! are skipped so newer peers can talk to older ones.

use thiserror::Error;

/// A single logical protocol event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `ready` — client finished local setup.
    Ready,
    /// `num:<n>` — host client requests the session's player count.
    PlayerCount(u32),
    /// `mv:<x>,<y>` — client asks to move its own entity.
    MoveRequest { x: i32, y: i32 },
    /// `mv:<id>,<x>,<y>` — server publishes an authoritative position.
    Move { id: u32, x: i32, y: i32 },
    /// `player:<slot>` — server assigns the recipient's connection slot.
    AssignSlot(u32),
    /// `world:<rows>` — initial grid snapshot, rows joined by commas.
    World(String),
    /// `begin` — simulation start.
    Begin,
    /// `kill:<id>` — entity eliminated.
    Kill(u32),
    /// `time:<secs>` — client-reported survival time.
    SurvivalTime(f32),
    /// `end:<names>` — final ranking, display names joined by commas.
    End(Vec<String>),
    /// `dc:<id>` — a player's connection closed.
    Disconnected(u32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("malformed `{tag}` payload: {payload:?}")]
    Malformed { tag: String, payload: String },
}

fn malformed(tag: &str, payload: &str) -> ProtocolError {
    ProtocolError::Malformed {
        tag: tag.to_string(),
        payload: payload.to_string(),
    }
}

/// Encodes one event as its wire segment (no trailing separator).
pub fn encode(event: &Event) -> String {
    match event {
        Event::Ready => "ready".to_string(),
        Event::PlayerCount(n) => format!("num:{}", n),
        Event::MoveRequest { x, y } => format!("mv:{},{}", x, y),
        Event::Move { id, x, y } => format!("mv:{},{},{}", id, x, y),
        Event::AssignSlot(slot) => format!("player:{}", slot),
        Event::World(rows) => format!("world:{}", rows),
        Event::Begin => "begin".to_string(),
        Event::Kill(id) => format!("kill:{}", id),
        Event::SurvivalTime(secs) => format!("time:{}", secs),
        Event::End(names) => format!("end:{}", names.join(",")),
        Event::Disconnected(id) => format!("dc:{}", id),
    }
}

/// Encodes a batch of events as one line, joined by `;`.
pub fn encode_line(events: &[Event]) -> String {
    events.iter().map(encode).collect::<Vec<_>>().join(";")
}

/// Decodes one received line into its events.
///
/// Empty segments are dropped silently. Each remaining segment decodes
/// independently: known tags with bad payloads yield an error entry, tags
/// this version does not know yield nothing at all.
pub fn decode_line(line: &str) -> Vec<Result<Event, ProtocolError>> {
    line.split(';')
        .filter(|segment| !segment.is_empty())
        .filter_map(decode_segment)
        .collect()
}

fn decode_segment(segment: &str) -> Option<Result<Event, ProtocolError>> {
    let (tag, payload) = segment.split_once(':').unwrap_or((segment, ""));

    let event = match tag {
        "ready" => Ok(Event::Ready),
        "begin" => Ok(Event::Begin),
        "num" => parse_u32(payload)
            .map(Event::PlayerCount)
            .ok_or_else(|| malformed(tag, payload)),
        "player" => parse_u32(payload)
            .map(Event::AssignSlot)
            .ok_or_else(|| malformed(tag, payload)),
        "kill" => parse_u32(payload)
            .map(Event::Kill)
            .ok_or_else(|| malformed(tag, payload)),
        "dc" => parse_u32(payload)
            .map(Event::Disconnected)
            .ok_or_else(|| malformed(tag, payload)),
        "time" => payload
            .parse::<f32>()
            .map(Event::SurvivalTime)
            .map_err(|_| malformed(tag, payload)),
        "mv" => decode_move(payload).ok_or_else(|| malformed(tag, payload)),
        "world" => Ok(Event::World(payload.to_string())),
        "end" => Ok(Event::End(
            payload
                .split(',')
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        // Forward-compatible no-op.
        _ => return None,
    };

    Some(event)
}

/// A two-field payload is a client move request, a three-field payload an
/// authoritative server update. Anything else is malformed.
fn decode_move(payload: &str) -> Option<Event> {
    let fields: Vec<u32> = payload
        .split(',')
        .map(parse_u32)
        .collect::<Option<Vec<_>>>()?;

    match fields[..] {
        [x, y] => Some(Event::MoveRequest {
            x: x as i32,
            y: y as i32,
        }),
        [id, x, y] => Some(Event::Move {
            id,
            x: x as i32,
            y: y as i32,
        }),
        _ => None,
    }
}

fn parse_u32(field: &str) -> Option<u32> {
    field.parse::<u32>().ok()
}
