#[cfg(test)]
pub const POST_DATA: &str = r#"---
title: "Lakeside mornings"
date: "2024-05-02"
excerpt: "Notes from the water"
image: "/blog/lakeside.png"
---

The lake at dawn is a different place. The boats have not gone out yet and
the water keeps the night's stillness a while longer.

I took the rod, the flask, and the small notebook I keep for these
mornings. Most entries in it say the same thing: the fish were elsewhere.

## What the water teaches

Patience, mostly. You learn to watch the line, to read the wind on the
surface, and to let an hour pass without asking anything of it.
"#;
