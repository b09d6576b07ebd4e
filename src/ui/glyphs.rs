/// Characters used to draw hit bars and panel decorations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyphs {
    pub bar_fill: char,
    pub clipped_left: char,
    pub clipped_right: char,
    pub h_separator: &'static str,
    pub selected_layer: &'static str,
}

pub fn select(fancy_requested: bool) -> Glyphs {
    if fancy_requested {
        fancy()
    } else {
        ascii()
    }
}

fn ascii() -> Glyphs {
    Glyphs {
        bar_fill: '=',
        clipped_left: '<',
        clipped_right: '>',
        h_separator: "-",
        selected_layer: ">",
    }
}

fn fancy() -> Glyphs {
    Glyphs {
        bar_fill: '━',
        clipped_left: '◀',
        clipped_right: '▶',
        h_separator: "─",
        selected_layer: "▸",
    }
}
