//! Prompt templates for diagram drafting and repair.
//!
//! Both templates instruct the model to answer with exactly one
//! `@startuml`/`@enduml` block; extraction tolerates models that wrap the
//! block in prose anyway.

/// System prompt for drafting a diagram from an idea.
pub const GENERATION_SYSTEM: &str = r#"You are a system design expert. Given an idea, generate a high-level architecture plan in PlantUML code only—do not include any extra text or internal reasoning. If any component is not connected (i.e., a box is not pointing anywhere), do not include it. Make it organized and clean.

Requirements:
- important thing is that you need to group things. use straight arrows to show the flow also along with others.
- Plan the overall system architecture at a high level.
- Use emojis as icons to represent key components (each on a new line).
- Organize the diagram into clear sections.
- Use arrows to indicate the flow and explain interactions.
- Instead of generic service names, use specific technology names where applicable (e.g., AWS S3, PostgreSQL, Docker, Kubernetes), but only include them if they are relevant.
- Output only valid PlantUML code between @startuml and @enduml, with no markdown wrappers.
- Always make it high level and fancy.
- Dont use emojis in aliases. and use space insread of new line in aliases.
- IMPORTANT: For any component names that span multiple lines, use the newline escape sequence (\n) instead of literal newlines.
- I want them organised not clutered here and there. try to group services

Here is an example for reference:
@startuml
title WebRTC Study Group Call Architecture

' Client Side
component "Web Browser\n📱" as client
component "WebRTC\n📹" as webrtc_client
component "React Web App\n📱" as web_app

' Backend Services
component "Node.js (Signaling Server)\n🛡️" as signaling_server
component "WebSocket\n📦" as websocket
component "Express.js\n📊" as express

component "PostgreSQL\n📁" as db
component "AWS S3\n📂" as s3
component "Matching Service\n🤖" as matching_service
component "Media Server\n🎥" as media_server

' WebRTC Interaction
client --> webrtc_client : Initialize
webrtc_client --> signaling_server : Register/Connect
signaling_server --> webrtc_client : Negotiate Connection
webrtc_client --> webrtc_client : Establish Peer Connection

' User Flow
client --> web_app : Join/Create Room
web_app --> signaling_server : Join Room Request
signaling_server --> matching_service : Find/Create Room
matching_service --> signaling_server : Assign Room
signaling_server --> web_app : Room Assignment

' Data Flow
db --> signaling_server : Store/Retrieve Room Data
s3 --> signaling_server : Store/Retrieve Recordings
webrtc_client --> s3 : Upload Recording

' Media Handling
webrtc_client --> media_server : Stream Media
media_server --> s3 : Store Recording

@enduml"#;

/// User message for the drafting call.
#[must_use]
pub fn generation_user(idea: &str) -> String {
    format!("Idea: {idea}")
}

/// System prompt for repairing diagram source that failed to render.
#[must_use]
pub fn repair_system(error: &str) -> String {
    format!(
        "You are a system design expert. The following PlantUML code produced an error when \
         rendering: \"{error}\". Please inspect the code and correct it so that it generates a \
         valid PlantUML diagram. Output only the corrected PlantUML code between @startuml and \
         @enduml with no extra text or internal reasoning. Make sure to use the newline escape \
         sequence (\\n) for multi-line component names."
    )
}

/// User message for the repair call.
#[must_use]
pub fn repair_user(source: &str) -> String {
    format!("PlantUML Code: {source}")
}
