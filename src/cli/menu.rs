//! Interactive console menu.
//!
//! Reproduces the classic numbered menu (add / display / search / exit) over
//! any `BufRead` + `Write` pair. End of input at any prompt ends the session.

use std::io::{self, BufRead, Write};

use super::{parse_year, render_table, unpersisted_warning};
use crate::config::YearRange;
use crate::library::{Catalog, CatalogError, RecordStore};

const RULE: &str = "===========================================================";

enum Flow {
    Continue,
    Quit,
}

/// Menu choices, numbered as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Add,
    Display,
    Search,
    Exit,
}

impl Choice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Add),
            "2" => Some(Self::Display),
            "3" => Some(Self::Search),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Line-oriented menu session
pub struct Menu<R, W> {
    input: R,
    output: W,
    years: YearRange,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, years: YearRange) -> Self {
        Self {
            input,
            output,
            years,
        }
    }

    /// Give back the output sink (used by tests to inspect the transcript)
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user exits or input ends
    pub fn run<S: RecordStore>(&mut self, catalog: &mut Catalog<S>) -> io::Result<()> {
        loop {
            self.print_menu()?;

            let Some(choice) = self.read_choice()? else {
                return Ok(());
            };

            let flow = match choice {
                Choice::Add => self.add_book(catalog)?,
                Choice::Display => self.display_books(catalog)?,
                Choice::Search => self.search_books(catalog)?,
                Choice::Exit => {
                    writeln!(
                        self.output,
                        "Thank you for using our LMS! Have a great day, and we hope"
                    )?;
                    writeln!(self.output, "to see you again soon!")?;
                    Flow::Quit
                }
            };

            if let Flow::Quit = flow {
                return Ok(());
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        let out = &mut self.output;
        writeln!(out, "================ LIBRARY MANAGEMENT SYSTEM ================")?;
        writeln!(out)?;
        writeln!(out, "Welcome to the Library Management System! Your gateway")?;
        writeln!(out, "to seamless library services.")?;
        writeln!(out)?;
        writeln!(out, "{}", RULE)?;
        writeln!(out)?;
        writeln!(out, "                           MENU")?;
        writeln!(out, "    1 - Add Book")?;
        writeln!(out, "    2 - Display Book")?;
        writeln!(out, "    3 - Search Book")?;
        writeln!(out, "    4 - Exit")?;
        writeln!(out)
    }

    fn read_choice(&mut self) -> io::Result<Option<Choice>> {
        loop {
            let Some(line) = self.prompt("Please select an option to get started (1-4): ")? else {
                return Ok(None);
            };

            if let Some(choice) = Choice::parse(&line) {
                writeln!(self.output)?;
                return Ok(Some(choice));
            }
            writeln!(
                self.output,
                "Invalid input. Please select a number between 1 and 4."
            )?;
        }
    }

    fn add_book<S: RecordStore>(&mut self, catalog: &mut Catalog<S>) -> io::Result<Flow> {
        writeln!(self.output, "= ADD BOOK ================================================")?;
        writeln!(self.output)?;

        let Some(title) = self.prompt("    Enter title: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(author) = self.prompt("    Enter author: ")? else {
            return Ok(Flow::Quit);
        };

        let year = loop {
            let Some(input) = self.prompt("    Enter year: ")? else {
                return Ok(Flow::Quit);
            };
            if let Some(year) = parse_year(&input, self.years) {
                break year;
            }
            writeln!(
                self.output,
                "    Invalid input. Please enter a year between {} and {}.",
                self.years.min, self.years.max
            )?;
        };

        match catalog.add(title, author, year) {
            Ok(outcome) => {
                writeln!(self.output, "    Book added successfully!")?;
                if let Some(warning) = unpersisted_warning(&outcome) {
                    writeln!(self.output, "    {}", warning)?;
                }
            }
            Err(CatalogError::Full { .. }) => {
                writeln!(self.output, "    Library is full. Cannot add more books.")?;
            }
            Err(e) => writeln!(self.output, "    {}", e)?,
        }

        self.pause("    Press enter to go back to Menu")
    }

    fn display_books<S: RecordStore>(&mut self, catalog: &Catalog<S>) -> io::Result<Flow> {
        writeln!(self.output, "= DISPLAY BOOK ============================================")?;

        if catalog.is_empty() {
            writeln!(self.output, "No books in the library.")?;
        } else {
            writeln!(self.output)?;
            write!(self.output, "{}", render_table(catalog.list_all()))?;
            writeln!(self.output)?;
        }

        self.pause("Press enter to go back to Menu")
    }

    fn search_books<S: RecordStore>(&mut self, catalog: &Catalog<S>) -> io::Result<Flow> {
        writeln!(self.output, "= SEARCH BOOK =============================================")?;
        writeln!(self.output)?;

        loop {
            let Some(title) = self.prompt("    Enter a book title to search: ")? else {
                return Ok(Flow::Quit);
            };

            match catalog.search(&title) {
                Some(record) => {
                    writeln!(self.output, "    Book found!")?;
                    writeln!(self.output, "{}", record)?;
                }
                None => writeln!(self.output, "    Book not found!")?,
            }

            let again = loop {
                let Some(answer) = self.prompt("    Search Book Again [Y/N]? ")? else {
                    return Ok(Flow::Quit);
                };
                match answer.trim() {
                    "Y" | "y" => break true,
                    "N" | "n" => break false,
                    _ => writeln!(
                        self.output,
                        "    Invalid input. Please enter 'Y' or 'N'."
                    )?,
                }
            };

            if !again {
                break;
            }
        }

        self.pause("    Press enter to go back to Menu")
    }

    /// Print `message` and wait for one line of input
    fn pause(&mut self, message: &str) -> io::Result<Flow> {
        writeln!(self.output, "{}", message)?;
        match self.read_line()? {
            Some(_) => Ok(Flow::Continue),
            None => Ok(Flow::Quit),
        }
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Read one line without its terminator; `None` at end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_parse() {
        assert_eq!(Choice::parse("1"), Some(Choice::Add));
        assert_eq!(Choice::parse(" 4 "), Some(Choice::Exit));
        assert_eq!(Choice::parse("5"), None);
        assert_eq!(Choice::parse("add"), None);
    }
}
