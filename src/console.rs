//! Console I/O helpers and scoped output capture.
//!
//! [`print`] and [`print_line`] write to standard output unless an [`OutputCapture`] is active on
//! the current thread, in which case the text goes into the innermost capture buffer instead. The
//! engine uses this to compare a method's console output against its declared expectation.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;

use crate::value::Value;

thread_local! {
    /// Active capture buffers, innermost last.
    static CAPTURES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn emit(text: &str) {
    let captured = CAPTURES.with(|stack| match stack.borrow_mut().last_mut() {
        Some(buffer) => {
            buffer.push_str(text);
            true
        }
        None => false,
    });
    if !captured {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

fn join(values: &[Value]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

/// Print values separated by a space. With no values, prints a newline.
pub fn print(values: &[Value]) {
    if values.is_empty() {
        emit("\n");
    } else {
        emit(&join(values));
    }
}

/// Print values separated by a space, followed by a newline.
pub fn print_line(values: &[Value]) {
    let mut line = join(values);
    line.push('\n');
    emit(&line);
}

/// Whether an [`OutputCapture`] is active on this thread.
pub fn is_capturing() -> bool {
    CAPTURES.with(|stack| !stack.borrow().is_empty())
}

/// Redirects [`print`] and [`print_line`] on this thread into a buffer until finished or dropped.
///
/// Captures nest; dropping a capture without finishing it discards its text and restores the
/// previous channel all the same.
#[must_use = "output is captured only while the guard is alive"]
#[derive(Debug)]
pub struct OutputCapture {
    depth: usize,
}

impl OutputCapture {
    pub fn begin() -> Self {
        let depth = CAPTURES.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(String::new());
            stack.len()
        });
        Self { depth }
    }

    /// Stop capturing and return everything printed since [`OutputCapture::begin`].
    pub fn finish(self) -> String {
        let text = self.pop();
        std::mem::forget(self);
        text
    }

    fn pop(&self) -> String {
        CAPTURES.with(|stack| {
            let mut stack = stack.borrow_mut();
            // An inner capture leaked by the captured code is folded away with ours
            stack.truncate(self.depth);
            stack.pop().unwrap_or_default()
        })
    }
}

impl Drop for OutputCapture {
    fn drop(&mut self) {
        self.pop();
    }
}

/// Write `prompt` (if any) to `out` and read one line from `input`, without its line terminator.
///
/// Returns `None` at end of input.
pub fn read_input_from<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: Option<&str>,
) -> io::Result<Option<String>> {
    if let Some(prompt) = prompt {
        out.write_all(prompt.as_bytes())?;
        out.flush()?;
    }
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Read one line from standard input.
pub fn read_input(prompt: Option<&str>) -> io::Result<Option<String>> {
    read_input_from(&mut io::stdin().lock(), &mut io::stdout(), prompt)
}

/// A key press, as far as password entry cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
}

/// Read a password from a key source, echoing `*` per character to `out`.
///
/// Backspace removes the last character and erases its mask with `"\b \b"`. Enter, or the end of
/// the key source, finishes the read. Control characters are dropped.
pub fn read_password_from<K, W>(keys: K, out: &mut W, prompt: Option<&str>) -> io::Result<String>
where
    K: IntoIterator<Item = io::Result<Key>>,
    W: Write,
{
    if let Some(prompt) = prompt {
        out.write_all(prompt.as_bytes())?;
    }
    out.flush()?;

    let mut password = String::new();
    for key in keys {
        match key? {
            Key::Enter => break,
            Key::Backspace => {
                if password.pop().is_some() {
                    out.write_all(b"\x08 \x08")?;
                }
            }
            Key::Char(c) if !c.is_control() => {
                password.push(c);
                out.write_all(b"*")?;
            }
            Key::Char(_) => {}
        }
        out.flush()?;
    }
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(password)
}

/// Read a password from the terminal without echoing it.
pub fn read_password(prompt: Option<&str>) -> io::Result<String> {
    terminal::enable_raw_mode()?;
    let result = read_password_from(std::iter::from_fn(|| Some(next_key())), &mut io::stdout(), prompt);
    terminal::disable_raw_mode()?;
    result
}

fn next_key() -> io::Result<Key> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => return Ok(Key::Enter),
                KeyCode::Backspace => return Ok(Key::Backspace),
                KeyCode::Char(c) => return Ok(Key::Char(c)),
                _ => {}
            }
        }
    }
}
