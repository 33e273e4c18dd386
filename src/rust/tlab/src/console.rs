use colored::Colorize;

pub fn info(s: &str) {
  println!("{} {s}", "[*]".bright_green());
}

pub fn problem(s: &str) {
  println!("{} {s}", "[!]".bright_red());
}
