//! Names every generated scene can use without defining them, and the
//! renamed animation-library APIs the repairer rewrites.

use std::sync::LazyLock;

use regex::Regex;

/// Interpreter builtins plus the implicit method receivers.
const LANGUAGE_NAMES: &[&str] = &[
    "self", "cls", "__name__", "__file__", "print", "range", "len", "list", "dict", "set",
    "tuple", "int", "float", "str", "bool", "bytes", "complex", "frozenset", "abs", "min",
    "max", "sum", "round", "pow", "divmod", "enumerate", "zip", "map", "filter", "sorted",
    "reversed", "iter", "next", "any", "all", "isinstance", "issubclass", "super", "type",
    "object", "getattr", "setattr", "hasattr", "delattr", "callable", "id", "hash", "repr",
    "format", "chr", "ord", "bin", "hex", "oct", "open", "input", "vars", "dir", "globals",
    "locals", "property", "staticmethod", "classmethod", "slice", "NotImplemented", "Ellipsis",
    "Exception", "BaseException", "ValueError", "TypeError", "KeyError", "IndexError",
    "NameError", "AttributeError", "RuntimeError", "ZeroDivisionError", "StopIteration",
    "NotImplementedError", "AssertionError", "ImportError",
];

/// Names exported by `from manim import *`.
const LIBRARY_NAMES: &[&str] = &[
    // Scenes and cameras
    "Scene", "ThreeDScene", "MovingCameraScene", "ZoomedScene", "VectorScene",
    "LinearTransformationScene", "SpecialThreeDScene", "SceneFileWriter", "Camera",
    "MovingCamera", "MultiCamera", "ThreeDCamera", "MappingCamera",
    // Core mobjects
    "Mobject", "Group", "VMobject", "VGroup", "VDict", "VectorizedPoint",
    "CurvesAsSubmobjects", "DashedVMobject", "PMobject", "Mobject1D", "Mobject2D", "PGroup",
    "PointCloudDot", "Point", "AbstractImageMobject", "ImageMobject", "ImageMobjectFromCamera",
    "ValueTracker", "ComplexValueTracker", "override_animate",
    // Geometry
    "TipableVMobject", "Arc", "ArcBetweenPoints", "CurvedArrow", "CurvedDoubleArrow",
    "Circle", "Dot", "AnnotationDot", "LabeledDot", "Ellipse", "AnnularSector", "Sector",
    "Annulus", "CubicBezier", "ArcPolygon", "ArcPolygonFromArcs", "Line", "DashedLine",
    "TangentLine", "Elbow", "Arrow", "Vector", "DoubleArrow", "Angle", "RightAngle",
    "Polygram", "Polygon", "RegularPolygram", "RegularPolygon", "Star", "Triangle",
    "Rectangle", "Square", "RoundedRectangle", "Cutout", "ConvexHull", "Label", "LabeledLine",
    "LabeledArrow", "LabeledPolygram", "SurroundingRectangle", "BackgroundRectangle", "Cross",
    "Underline", "Union", "Intersection", "Difference", "Exclusion", "ScreenRectangle",
    "FullScreenRectangle", "ArrowTip", "ArrowTriangleTip", "ArrowTriangleFilledTip",
    "ArrowCircleTip", "ArrowCircleFilledTip", "ArrowSquareTip", "ArrowSquareFilledTip",
    "StealthTip",
    // Graphing
    "CoordinateSystem", "Axes", "ThreeDAxes", "NumberPlane", "PolarPlane", "ComplexPlane",
    "NumberLine", "UnitInterval", "ParametricFunction", "FunctionGraph", "ImplicitFunction",
    "BarChart", "SampleSpace", "LinearBase", "LogBase", "Graph", "DiGraph", "GenericGraph",
    "VectorField", "ArrowVectorField", "StreamLines",
    // Matrices and tables
    "Matrix", "DecimalMatrix", "IntegerMatrix", "MobjectMatrix", "matrix_to_tex_string",
    "matrix_to_mobject", "get_det_text", "Table", "MathTable", "MobjectTable", "IntegerTable",
    "DecimalTable",
    // Text and SVG
    "Text", "MarkupText", "Paragraph", "register_font", "Tex", "MathTex",
    "SingleStringMathTex", "Title", "BulletedList", "Code", "DecimalNumber", "Integer",
    "Variable", "SVGMobject", "VMobjectFromSVGPath", "Brace", "BraceLabel", "BraceText",
    "BraceBetweenPoints", "ArcBrace", "TexTemplate", "TexTemplateLibrary", "TexFontTemplates",
    "ManimBanner",
    // Three dimensions
    "ThreeDVMobject", "Surface", "Sphere", "Dot3D", "Cube", "Prism", "Cone", "Arrow3D",
    "Cylinder", "Line3D", "Torus", "Polyhedron", "Tetrahedron", "Octahedron", "Icosahedron",
    "Dodecahedron", "ConvexHull3D",
    // Animations
    "Animation", "Wait", "Add", "override_animation", "prepare_animation", "AnimationGroup",
    "Succession", "LaggedStart", "LaggedStartMap", "ShowPartial", "Create", "Uncreate",
    "DrawBorderThenFill", "Write", "Unwrite", "SpiralIn", "ShowIncreasingSubsets",
    "ShowSubmobjectsOneByOne", "AddTextLetterByLetter", "RemoveTextLetterByLetter",
    "AddTextWordByWord", "TypeWithCursor", "UntypeWithCursor", "FadeIn", "FadeOut",
    "GrowFromPoint", "GrowFromCenter", "GrowFromEdge", "GrowArrow", "SpinInFromNothing",
    "FocusOn", "Indicate", "Flash", "ShowPassingFlash", "ShowPassingFlashWithThinningStrokeWidth",
    "ApplyWave", "Circumscribe", "Wiggle", "Blink", "Homotopy", "SmoothedVectorizedHomotopy",
    "ComplexHomotopy", "PhaseFlow", "MoveAlongPath", "ChangingDecimal", "ChangeDecimalToValue",
    "Rotating", "Rotate", "Broadcast", "ChangeSpeed", "Transform", "ReplacementTransform",
    "TransformFromCopy", "ClockwiseTransform", "CounterclockwiseTransform", "MoveToTarget",
    "ApplyMethod", "ApplyPointwiseFunction", "ApplyPointwiseFunctionToCenter", "FadeToColor",
    "FadeTransform", "FadeTransformPieces", "ScaleInPlace", "ShrinkToCenter", "Restore",
    "ApplyFunction", "ApplyMatrix", "ApplyComplexFunction", "CyclicReplace", "Swap",
    "TransformAnimations", "TransformMatchingAbstractBase", "TransformMatchingShapes",
    "TransformMatchingTex", "AnimatedBoundary", "TracedPath",
    // Updaters
    "UpdateFromFunc", "UpdateFromAlphaFunc", "MaintainPositionRelativeTo", "always",
    "f_always", "always_redraw", "always_shift", "always_rotate", "turn_animation_into_updater",
    "cycle_animation", "assert_is_mobject_method",
    // Constants and configuration
    "config", "tempconfig", "PI", "TAU", "DEGREES", "RADIANS", "ORIGIN", "UP", "DOWN",
    "LEFT", "RIGHT", "IN", "OUT", "UL", "UR", "DL", "DR", "X_AXIS", "Y_AXIS", "Z_AXIS",
    "START_X", "START_Y", "SMALL_BUFF", "MED_SMALL_BUFF", "MED_LARGE_BUFF", "LARGE_BUFF",
    "DEFAULT_MOBJECT_TO_EDGE_BUFFER", "DEFAULT_MOBJECT_TO_MOBJECT_BUFFER", "DEFAULT_FONT_SIZE",
    "DEFAULT_DOT_RADIUS", "DEFAULT_SMALL_DOT_RADIUS", "DEFAULT_DASH_LENGTH",
    "DEFAULT_ARROW_TIP_LENGTH", "DEFAULT_STROKE_WIDTH", "DEFAULT_WAIT_TIME",
    "SCALE_FACTOR_PER_FONT_POINT", "FRAME_WIDTH", "FRAME_HEIGHT", "UP_LEFT", "NORMAL",
    "ITALIC", "OBLIQUE", "BOLD", "THIN", "ULTRALIGHT", "LIGHT", "SEMILIGHT", "BOOK", "MEDIUM",
    "SEMIBOLD", "ULTRABOLD", "HEAVY", "ULTRAHEAVY", "QUALITIES", "RendererType",
    "LineJointType", "CapStyleType",
    // Colors
    "WHITE", "BLACK", "GRAY", "GREY", "RED", "GREEN", "BLUE", "YELLOW", "ORANGE", "PURPLE",
    "PINK", "TEAL", "GOLD", "MAROON", "LIGHT_GRAY", "DARK_GRAY", "LIGHT_GREY", "DARK_GREY",
    "DARKER_GRAY", "LIGHTER_GRAY", "DARKER_GREY", "LIGHTER_GREY", "DARK_BLUE", "DARK_BROWN",
    "LIGHT_BROWN", "GRAY_BROWN", "GREY_BROWN", "LIGHT_PINK", "PURE_RED", "PURE_GREEN",
    "PURE_BLUE", "LOGO_WHITE", "LOGO_GREEN", "LOGO_BLUE", "LOGO_RED", "LOGO_BLACK",
    "ManimColor", "ParsableManimColor", "HSV", "RGBA", "XKCD", "X11", "AS2700", "BS381",
    "DVIPSNAMES", "SVGNAMES", "color_gradient", "interpolate_color", "rgb_to_color",
    "rgba_to_color", "rgb_to_hex", "hex_to_rgb", "color_to_rgb", "color_to_rgba",
    "color_to_int_rgb", "color_to_int_rgba", "average_color", "random_color",
    "random_bright_color", "invert_color", "get_shaded_rgb",
    // Rate functions
    "rate_functions", "linear", "smooth", "smoothstep", "smootherstep", "smoothererstep",
    "rush_into", "rush_from", "slow_into", "double_smooth", "there_and_back",
    "there_and_back_with_pause", "running_start", "not_quite_there", "wiggle",
    "squish_rate_func", "lingering", "exponential_decay", "unit_interval", "zero",
    // Paths, geometry and numeric helpers
    "straight_path", "path_along_arc", "path_along_circles", "clockwise_path",
    "counterclockwise_path", "spiral_path", "bezier", "interpolate", "mid",
    "inverse_interpolate", "match_interpolate", "integer_interpolate", "rotate_vector",
    "rotation_matrix", "rotation_about_z", "angle_of_vector", "angle_between_vectors",
    "normalize", "get_norm", "cross", "line_intersection", "find_intersection",
    "midpoint", "complex_to_R3", "R3_to_complex", "choose", "clip", "sigmoid",
    "binary_search", "index_labels", "print_family",
];

static COLOR_SHADE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:RED|GREEN|BLUE|YELLOW|GOLD|TEAL|PURPLE|MAROON|GRAY|GREY)_[A-E]$")
        .expect("valid regex")
});

static EASING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ease_(?:in|out|in_out)_[a-z]+$").expect("valid regex")
});

/// Renamed APIs: `(old identifier, replacement identifier)`.
pub const DEPRECATED_NAMES: &[(&str, &str)] = &[
    ("ShowCreation", "Create"),
    ("TextMobject", "Text"),
    ("TexMobject", "MathTex"),
    ("FadeInFrom", "FadeIn"),
    ("FadeInFromDown", "FadeIn"),
    ("FadeOutAndShift", "FadeOut"),
    ("CircleIndicate", "Circumscribe"),
    ("container_align", "arrange"),
    ("arrange_submobjects", "arrange"),
    ("get_center_of_mass", "get_center"),
    ("add_points_as_corners", "set_points_as_corners"),
    ("get_graph", "plot"),
];

/// Known exports of standard modules commonly star-imported by scenes.
const STAR_EXPORTS: &[(&str, &[&str])] = &[
    (
        "math",
        &[
            "pi", "e", "tau", "inf", "nan", "sqrt", "isqrt", "exp", "log", "log2", "log10",
            "pow", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "sinh", "cosh",
            "tanh", "degrees", "radians", "hypot", "dist", "floor", "ceil", "trunc", "fabs",
            "fmod", "copysign", "factorial", "comb", "perm", "gcd", "lcm", "prod", "isclose",
            "isfinite", "isinf", "isnan",
        ],
    ),
    (
        "random",
        &[
            "random", "randint", "randrange", "uniform", "choice", "choices", "shuffle",
            "sample", "seed", "gauss",
        ],
    ),
];

/// Names bound by `from <module> import *`, when known.
pub fn star_exports(module: &str) -> Option<&'static [&'static str]> {
    STAR_EXPORTS
        .iter()
        .find(|(name, _)| *name == module)
        .map(|(_, exports)| *exports)
}

/// Whether `name` resolves without any definition in the script.
pub fn is_builtin(name: &str) -> bool {
    LANGUAGE_NAMES.contains(&name)
        || LIBRARY_NAMES.contains(&name)
        || COLOR_SHADE_RE.is_match(name)
        || EASING_RE.is_match(name)
}

/// Replacement for a renamed API, if `name` is one.
pub fn replacement_for(name: &str) -> Option<&'static str> {
    DEPRECATED_NAMES
        .iter()
        .find(|(old, _)| *old == name)
        .map(|(_, new)| *new)
}
