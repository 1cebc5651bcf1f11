//! Built-in prompt texts and the guard applied to raw generator output.

/// Used when the prompt store has no active prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a Manim code expert. Convert the user's description into executable Manim code.

1. Return only executable Python code, with no explanations or comments.
2. Use the Manim Community v0.19.0 API.
3. Use the correct import: `from manim import *`
4. Use the modern API, for example:
   - `config.frame_width` instead of `FRAME_WIDTH`
   - `Line.point_from_proportion()` instead of `get_point_from_function()`
5. Define every animation inside the scene class.
6. Use MathTex and Tex for content that needs LaTeX rendering.
7. Pass every argument correctly; each function only accepts its expected parameters.
8. Make sure the code for each animation is complete and runnable.
";

/// Scene returned when no generation backend is configured.
pub const SAMPLE_SCRIPT: &str = r#"from manim import *

class MathAnimation(Scene):
    def construct(self):
        title = Text("Math Demo", font_size=48)
        title.to_edge(UP)
        self.play(Write(title))

        circle = Circle(radius=1.0, color=BLUE)
        square = Square(side_length=2.0, color=GREEN)
        square.next_to(circle, RIGHT, buff=0.5)

        self.play(Create(circle), Create(square))
        self.wait()

        circle_text = Text("Circle", font_size=24).next_to(circle, DOWN)
        square_text = Text("Square", font_size=24).next_to(square, DOWN)

        self.play(Write(circle_text), Write(square_text))
        self.wait()

        self.play(circle.animate.set_color(RED), square.animate.set_color(YELLOW))
        self.wait()

        self.play(circle.animate.shift(LEFT*2), square.animate.shift(RIGHT*2))
        self.wait()

        self.play(
            FadeOut(circle),
            FadeOut(square),
            FadeOut(circle_text),
            FadeOut(square_text),
            FadeOut(title)
        )
"#;

const MANIM_IMPORT: &str = "from manim import *";

/// Characters of the prompt echoed by the placeholder scene.
const ECHO_CHARS: usize = 30;

/// Wrap the caller's description in the generation instructions.
pub fn user_prompt(description: &str) -> String {
    format!(
        "Convert the following description into Manim animation code:

{description}

Return only executable Python code that meets these requirements:
1. Use the Manim Community v0.19.0 API
2. Handle LaTeX formula rendering correctly
3. Avoid deprecated APIs
4. Keep the animation logic correct
5. Follow PEP 8
6. Do not add extra explanations or comments
"
    )
}

/// Make sure generator output imports the library; empty output becomes a
/// simple scene echoing the prompt.
pub fn ensure_manim_import(code: &str, prompt: &str) -> String {
    if code.trim().is_empty() {
        tracing::warn!("Generator returned empty output, using placeholder scene");
        return format!("{MANIM_IMPORT}\n\n{}", fallback_scene(prompt));
    }
    if code.contains("from manim import") {
        return code.to_string();
    }
    tracing::warn!("Generator output lacks the library import, prefixing it");
    format!("{MANIM_IMPORT}\n\n{code}")
}

/// A minimal scene showing the first characters of `prompt`.
pub fn fallback_scene(prompt: &str) -> String {
    let echo: String = prompt
        .chars()
        .take(ECHO_CHARS)
        .collect::<String>()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', " ");
    format!(
        r#"class SimpleScene(Scene):
    def construct(self):
        title = Text("{echo}...", font_size=36)
        title.to_edge(UP)
        self.play(Write(title))
        self.wait(1)

        prompt_text = Text("The prompt was too complex to generate code", font_size=24, color=RED)
        prompt_text.next_to(title, DOWN, buff=1)
        self.play(FadeIn(prompt_text))
        self.wait(2)

        self.play(FadeOut(title), FadeOut(prompt_text))
        self.wait(1)
"#
    )
}

#[cfg(test)]
mod tests {
    use animforge_core::script::{scene, validate};

    use super::*;

    #[test]
    fn sample_script_is_clean() {
        let report = validate::validate(SAMPLE_SCRIPT);
        assert!(report.valid, "issues: {:?}", report.issues);
        assert_eq!(
            scene::extract_scene(SAMPLE_SCRIPT).unwrap().entry_name,
            "MathAnimation"
        );
    }

    #[test]
    fn missing_import_is_prefixed() {
        let code = "class A(Scene):\n    pass\n";
        assert_eq!(
            ensure_manim_import(code, "x"),
            "from manim import *\n\nclass A(Scene):\n    pass\n"
        );
        let already = "from manim import Circle\n";
        assert_eq!(ensure_manim_import(already, "x"), already);
    }

    #[test]
    fn empty_output_becomes_echo_scene() {
        let code = ensure_manim_import("  \n", "Show the \"Pythagorean\" theorem with squares on each side");
        assert!(code.starts_with("from manim import *\n\nclass SimpleScene(Scene):"));
        assert!(code.contains(r#"Text("Show the \"Pythagorean\" theorem...", font_size=36)"#));
        assert!(validate::validate(&code).valid);
    }

    #[test]
    fn user_prompt_embeds_description() {
        let prompt = user_prompt("A rotating square");
        assert!(prompt.contains("\n\nA rotating square\n\n"));
        assert!(prompt.contains("v0.19.0"));
    }
}
