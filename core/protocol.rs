// Wire protocol: text framing and acknowledgment - pure functions, no I/O
use crate::types::{Command, CommandEvent, DecodeError, Verb};

impl Command {
    // Split on the first ':' for the verb, then on ':' for the args.
    // Field text is kept verbatim so encode() reproduces the input.
    pub fn decode(raw: &[u8]) -> Result<Command, DecodeError> {
        let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidEncoding)?;
        if text.is_empty() {
            return Err(DecodeError::EmptyCommand);
        }

        match text.split_once(':') {
            Some((verb, rest)) => Ok(Command {
                verb: Verb::parse(verb),
                args: rest.split(':').map(str::to_string).collect(),
            }),
            None => Ok(Command::new(Verb::parse(text))),
        }
    }

    // Canonical "verb[:arg...]" text form
    pub fn text(&self) -> String {
        if self.args.is_empty() {
            self.verb.as_str().to_string()
        } else {
            format!("{}:{}", self.verb.as_str(), self.args.join(":"))
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.text().into_bytes()
    }

    // Acknowledgment echoes the command text verbatim
    pub fn ack(&self) -> String {
        format!("ACK:{}", self.text())
    }
}

impl CommandEvent {
    // Dispatch table: recognized verbs produce an observable event,
    // everything else passes through uninterpreted.
    pub fn from_command(cmd: &Command) -> Option<CommandEvent> {
        match &cmd.verb {
            dir if dir.is_direction() => Some(CommandEvent::Movement(dir.clone())),
            Verb::Toggle => Some(CommandEvent::Toggled),
            Verb::Button if !cmd.args.is_empty() => {
                Some(CommandEvent::ButtonPressed(cmd.args.join(":")))
            }
            Verb::Touch if cmd.args.len() >= 2 => {
                Some(CommandEvent::TouchAt(cmd.args[0].clone(), cmd.args[1].clone()))
            }
            Verb::Mode if !cmd.args.is_empty() => {
                Some(CommandEvent::ModeChanged(cmd.args.join(":")))
            }
            _ => None,
        }
    }
}

// Reassembles newline-delimited frames from a byte stream. Completed
// lines come back without the terminator ('\r' trimmed); a trailing
// partial line stays buffered for the next push.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer { pending: Vec::new() }
    }

    pub fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(data);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop(); // '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_bare_verb() {
        let cmd = Command::decode(b"UP").unwrap();
        assert_eq!(cmd, Command::new(Verb::Up));
        assert_eq!(cmd.text(), "UP");
    }

    #[test]
    fn decode_verb_with_args() {
        let cmd = Command::decode(b"TOUCH:100:200").unwrap();
        assert_eq!(cmd.verb, Verb::Touch);
        assert_eq!(cmd.args, vec!["100", "200"]);
    }

    #[test]
    fn decode_unknown_verb_passes_through() {
        let cmd = Command::decode(b"CALIBRATE:fast").unwrap();
        assert_eq!(cmd.verb, Verb::Other("CALIBRATE".to_string()));
        assert_eq!(cmd.text(), "CALIBRATE:fast");
    }

    #[test]
    fn decode_is_case_sensitive() {
        let cmd = Command::decode(b"up").unwrap();
        assert_eq!(cmd.verb, Verb::Other("up".to_string()));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert_eq!(Command::decode(&[0xff, 0xfe]), Err(DecodeError::InvalidEncoding));
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert_eq!(Command::decode(b""), Err(DecodeError::EmptyCommand));
    }

    #[test]
    fn round_trip_recognized_grammar() {
        let commands = vec![
            Command::new(Verb::Up),
            Command::new(Verb::Down),
            Command::new(Verb::Left),
            Command::new(Verb::Right),
            Command::new(Verb::Toggle),
            Command::new(Verb::Mode),
            Command::button("UP"),
            Command::touch(100, 200),
            Command::mode("AUTO"),
        ];
        for cmd in commands {
            assert_eq!(Command::decode(&cmd.encode()).unwrap(), cmd);
        }
    }

    #[test]
    fn ack_echoes_command_text_verbatim() {
        // Trailing empty field survives the echo
        let cmd = Command::decode(b"BUTTON:UP:").unwrap();
        assert_eq!(cmd.ack(), "ACK:BUTTON:UP:");
        assert_eq!(Command::touch(100, 200).ack(), "ACK:TOUCH:100:200");
    }

    #[test]
    fn events_for_recognized_verbs() {
        let touch = Command::decode(b"TOUCH:100:200").unwrap();
        assert_eq!(
            CommandEvent::from_command(&touch),
            Some(CommandEvent::TouchAt("100".to_string(), "200".to_string()))
        );

        let button = Command::decode(b"BUTTON:UP").unwrap();
        assert_eq!(
            CommandEvent::from_command(&button),
            Some(CommandEvent::ButtonPressed("UP".to_string()))
        );

        let mode = Command::decode(b"MODE:MANUAL").unwrap();
        assert_eq!(
            CommandEvent::from_command(&mode),
            Some(CommandEvent::ModeChanged("MANUAL".to_string()))
        );
    }

    #[test]
    fn no_event_for_unknown_or_incomplete() {
        assert_eq!(CommandEvent::from_command(&Command::decode(b"PING").unwrap()), None);
        // TOUCH with a single coordinate is acknowledged but not interpreted
        assert_eq!(CommandEvent::from_command(&Command::decode(b"TOUCH:100").unwrap()), None);
        // Bare BUTTON has no name to report
        assert_eq!(CommandEvent::from_command(&Command::decode(b"BUTTON").unwrap()), None);
    }

    #[test]
    fn line_buffer_splits_complete_lines() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"BUTTON:UP\nBUTTON:DOWN\n");
        assert_eq!(lines, vec![b"BUTTON:UP".to_vec(), b"BUTTON:DOWN".to_vec()]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn line_buffer_retains_partial_tail() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"TOUCH:1"), Vec::<Vec<u8>>::new());
        let lines = buf.push(b"00:200\nMO");
        assert_eq!(lines, vec![b"TOUCH:100:200".to_vec()]);
        assert_eq!(buf.push(b"DE\n"), vec![b"MODE".to_vec()]);
    }

    #[test]
    fn line_buffer_trims_carriage_return() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"UP\r\n"), vec![b"UP".to_vec()]);
    }
}
