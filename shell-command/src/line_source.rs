/// Supplies additional input lines while a command line is being parsed,
/// e.g. the body of a here-document.
///
/// Interactive sessions back this with the line editor; scripts hand over
/// their remaining lines.
pub trait LineSource {
    /// Returns the next line without its trailing newline, or `None` once
    /// the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

impl<I> LineSource for I
where
    I: Iterator<Item = String>,
{
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.next()
    }
}
