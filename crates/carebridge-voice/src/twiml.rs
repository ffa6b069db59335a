//! Voice markup rendering
//!
//! Turns a [`ConnectionInstruction`] into a TwiML `<Response>` document.
//! Only the verbs the bridge needs are emitted: `Say`, `Play`, `Pause`,
//! `Redirect`, `Dial`/`Sip` and `Hangup`.

use carebridge_core::models::ConnectionInstruction;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use crate::client::VoiceError;

/// Content type of rendered documents
pub const CONTENT_TYPE: &str = "text/xml";

const GOODBYE: &str = "Thank you for calling. Goodbye.";

/// Streaming TwiML document builder
pub struct TwimlRenderer {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl TwimlRenderer {
    /// Start a new `<Response>` document
    pub fn new() -> Result<Self, VoiceError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(markup_error)?;
        writer
            .write_event(Event::Start(BytesStart::new("Response")))
            .map_err(markup_error)?;
        Ok(Self { writer })
    }

    /// Render a whole instruction
    pub fn render(instruction: &ConnectionInstruction) -> Result<String, VoiceError> {
        let mut doc = Self::new()?;

        match instruction {
            ConnectionInstruction::Hold {
                greeting,
                hold_audio,
                pause_secs,
                redirect_url,
            } => {
                if let Some(greeting) = greeting {
                    doc.say(greeting)?;
                }
                if let Some(audio) = hold_audio {
                    doc.play(audio)?;
                }
                doc.pause(*pause_secs)?;
                doc.redirect(redirect_url)?;
            }
            ConnectionInstruction::Bridge {
                announcement,
                sip_uri,
                timeout_secs,
            } => {
                doc.say(announcement)?;
                doc.dial_sip(sip_uri, *timeout_secs)?;
            }
            ConnectionInstruction::Hangup { message } => {
                doc.say(message)?;
                doc.hangup()?;
            }
        }

        doc.finish()
    }

    /// Goodbye message followed by a hangup
    pub fn goodbye() -> Result<String, VoiceError> {
        Self::render(&ConnectionInstruction::hangup(GOODBYE))
    }

    pub fn say(&mut self, text: &str) -> Result<&mut Self, VoiceError> {
        self.text_element(BytesStart::new("Say"), text)
    }

    pub fn play(&mut self, url: &str) -> Result<&mut Self, VoiceError> {
        self.text_element(BytesStart::new("Play"), url)
    }

    pub fn pause(&mut self, length_secs: u32) -> Result<&mut Self, VoiceError> {
        let mut pause = BytesStart::new("Pause");
        pause.push_attribute(("length", length_secs.to_string().as_str()));
        self.writer
            .write_event(Event::Empty(pause))
            .map_err(markup_error)?;
        Ok(self)
    }

    pub fn redirect(&mut self, url: &str) -> Result<&mut Self, VoiceError> {
        let mut redirect = BytesStart::new("Redirect");
        redirect.push_attribute(("method", "POST"));
        self.text_element(redirect, url)
    }

    pub fn dial_sip(&mut self, sip_uri: &str, timeout_secs: u32) -> Result<&mut Self, VoiceError> {
        let mut dial = BytesStart::new("Dial");
        dial.push_attribute(("timeout", timeout_secs.to_string().as_str()));
        self.writer
            .write_event(Event::Start(dial))
            .map_err(markup_error)?;
        self.text_element(BytesStart::new("Sip"), sip_uri)?;
        self.writer
            .write_event(Event::End(BytesEnd::new("Dial")))
            .map_err(markup_error)?;
        Ok(self)
    }

    pub fn hangup(&mut self) -> Result<&mut Self, VoiceError> {
        self.writer
            .write_event(Event::Empty(BytesStart::new("Hangup")))
            .map_err(markup_error)?;
        Ok(self)
    }

    /// Close `<Response>` and return the document
    pub fn finish(mut self) -> Result<String, VoiceError> {
        self.writer
            .write_event(Event::End(BytesEnd::new("Response")))
            .map_err(markup_error)?;
        let xml = self.writer.into_inner().into_inner();
        String::from_utf8(xml).map_err(markup_error)
    }

    fn text_element(&mut self, start: BytesStart<'_>, text: &str) -> Result<&mut Self, VoiceError> {
        let end = start.to_end().into_owned();
        self.writer
            .write_event(Event::Start(start))
            .map_err(markup_error)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(markup_error)?;
        self.writer
            .write_event(Event::End(end))
            .map_err(markup_error)?;
        Ok(self)
    }
}

fn markup_error(e: impl std::fmt::Display) -> VoiceError {
    VoiceError::Markup(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

    #[test]
    fn test_bridge_dials_sip_uri() {
        let xml = TwimlRenderer::render(&ConnectionInstruction::Bridge {
            announcement: "Connecting you now.".to_string(),
            sip_uri: "sip:incoming-CA123@sip.example.org".to_string(),
            timeout_secs: 30,
        })
        .unwrap();

        assert_eq!(
            xml,
            format!(
                "{}<Response><Say>Connecting you now.</Say><Dial timeout=\"30\">\
                 <Sip>sip:incoming-CA123@sip.example.org</Sip></Dial></Response>",
                DECL
            )
        );
    }

    #[test]
    fn test_hold_with_greeting_and_music() {
        let xml = TwimlRenderer::render(&ConnectionInstruction::Hold {
            greeting: Some("Please hold.".to_string()),
            hold_audio: Some("https://cdn.example.org/hold.mp3".to_string()),
            pause_secs: 3,
            redirect_url: "https://example.org/api/twiml/wait-for-provider?callSid=CA1&attempt=1"
                .to_string(),
        })
        .unwrap();

        assert!(xml.contains("<Say>Please hold.</Say>"));
        assert!(xml.contains("<Play>https://cdn.example.org/hold.mp3</Play>"));
        assert!(xml.contains("<Pause length=\"3\"/>"));
        assert!(xml.contains(
            "<Redirect method=\"POST\">https://example.org/api/twiml/wait-for-provider?callSid=CA1&amp;attempt=1</Redirect>"
        ));
    }

    #[test]
    fn test_hold_without_greeting_only_polls() {
        let xml = TwimlRenderer::render(&ConnectionInstruction::Hold {
            greeting: None,
            hold_audio: None,
            pause_secs: 3,
            redirect_url: "/next".to_string(),
        })
        .unwrap();

        assert!(!xml.contains("<Say>"));
        assert!(!xml.contains("<Play>"));
        assert!(xml.ends_with("<Pause length=\"3\"/><Redirect method=\"POST\">/next</Redirect></Response>"));
    }

    #[test]
    fn test_goodbye_hangs_up() {
        let xml = TwimlRenderer::goodbye().unwrap();
        assert!(xml.contains("<Say>Thank you for calling. Goodbye.</Say><Hangup/>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = TwimlRenderer::render(&ConnectionInstruction::hangup("Q&A <closed>")).unwrap();
        assert!(xml.contains("<Say>Q&amp;A &lt;closed&gt;</Say>"));
    }
}
