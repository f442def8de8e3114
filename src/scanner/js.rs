//! JavaScript probes evaluated in-page by the behavioral scanner.
//! Kept as plain string constants rather than a templating layer — none of
//! them take parameters, so there is nothing to inject.

pub const DOM_STATS: &str = r#"(() => {
    const all = document.querySelectorAll('*');
    let maxDepth = 0, totalDepth = 0;
    all.forEach(el => {
        let depth = 0, p = el;
        while (p) { depth++; p = p.parentElement; }
        totalDepth += depth;
        if (depth > maxDepth) maxDepth = depth;
    });
    return {
        node_count: all.length,
        avg_depth: all.length ? totalDepth / all.length : 0,
        max_depth: maxDepth,
    };
})()"#;

pub const INSTALL_MUTATION_COUNTER: &str = r#"(() => {
    window.__scan_mutation_count = 0;
    window.__scan_observer = new MutationObserver((muts) => {
        window.__scan_mutation_count += muts.length;
    });
    window.__scan_observer.observe(document.documentElement, {
        childList: true, subtree: true, attributes: true, characterData: true,
    });
    return true;
})()"#;

pub const READ_MUTATION_COUNT: &str = r#"window.__scan_mutation_count || 0"#;

pub const TECH_STACK: &str = r#"(() => {
    const hasShadow = Array.from(document.querySelectorAll('*')).some(el => !!el.shadowRoot);
    let framework = null;
    if (window.__NEXT_DATA__ || window.__NUXT__) framework = window.__NEXT_DATA__ ? 'next' : 'nuxt';
    else if (window.React || document.querySelector('[data-reactroot], #__next, #root')) framework = 'react';
    else if (window.Vue || document.querySelector('[data-v-app]')) framework = 'vue';
    else if (window.angular || document.querySelector('[ng-version]')) framework = 'angular';
    else if (window.__SVELTE__) framework = 'svelte';

    const bodyText = document.body ? document.body.innerText.toLowerCase() : '';
    let antiBot = null;
    if (document.title.toLowerCase().includes('just a moment') ||
        document.querySelector('#cf-browser-verification, .cf-browser-verification')) {
        antiBot = 'cloudflare';
    } else if (document.querySelector('iframe[src*="recaptcha"], .g-recaptcha, iframe[src*="hcaptcha"]')) {
        antiBot = 'captcha';
    }

    const signinRequired = /\b(sign in|log in|login required|please log in)\b/.test(bodyText) &&
        !!document.querySelector('button, a, input[type="submit"]');

    return {
        framework,
        shadow_dom: hasShadow,
        anti_bot: antiBot,
        bot_defense_vendors: [],
        signin_required: signinRequired,
    };
})()"#;

pub const SCRIPT_SOURCES: &str = r#"Array.from(document.scripts).map(s => s.src).filter(Boolean)"#;

pub const STRUCTURAL_SIGNALS: &str = r#"(() => {
    const iframeCount = document.querySelectorAll('iframe').length;
    const navText = Array.from(document.querySelectorAll('nav')).map(n => n.innerText).join(' ');
    const bodyText = document.body ? document.body.innerText : '';
    const ratio = bodyText.length ? navText.length / bodyText.length : 0;
    const landmarks = document.querySelectorAll(
        '[role=navigation],[role=main],[role=banner],[role=contentinfo],nav,main,header,footer,aside'
    ).length;

    const containers = Array.from(document.querySelectorAll('body *'))
        .filter(el => el.children.length >= 4);
    let repeatingSelector = null;
    let bestCount = 0;
    for (const container of containers) {
        const classCounts = new Map();
        for (const child of container.children) {
            const cls = child.className && typeof child.className === 'string' ? child.className.trim().split(/\s+/)[0] : null;
            if (!cls) continue;
            classCounts.set(cls, (classCounts.get(cls) || 0) + 1);
        }
        for (const [cls, count] of classCounts) {
            if (count > bestCount && count >= 4) {
                bestCount = count;
                repeatingSelector = `.${cls}`;
            }
        }
    }

    const hiddenInputs = Array.from(document.querySelectorAll('form input[type="text"], form input:not([type])'))
        .filter(el => {
            const style = window.getComputedStyle(el);
            return style.display === 'none' || style.visibility === 'hidden' || el.offsetParent === null;
        }).length;

    return {
        iframe_count: iframeCount,
        nav_to_content_ratio: ratio,
        repeating_unit_selector: repeatingSelector,
        accessibility_landmarks: landmarks,
        hidden_input_count: hiddenInputs,
    };
})()"#;

pub const LOGIN_SURFACE: &str = r#"(() => {
    const bodyText = document.body ? document.body.innerText.toLowerCase() : '';
    const hasLoginButton = !!document.querySelector(
        'button, a, input[type="submit"]'
    ) && /\b(sign in|log in|login)\b/.test(bodyText);
    const authRequiredBlock = /\b(access denied|unauthorized|please sign in to continue)\b/.test(bodyText);
    const authPromptText = /\b(create an account|members only|subscribe to continue)\b/.test(bodyText);
    const blurred = Array.from(document.querySelectorAll('*')).some(el => {
        const filter = window.getComputedStyle(el).filter;
        return filter && filter.includes('blur');
    });
    const overlay = !!document.querySelector(
        '[class*="paywall"],[class*="auth-overlay"],[class*="login-modal"]'
    );
    return {
        login_button: hasLoginButton,
        auth_required_block: authRequiredBlock,
        auth_prompt_text: authPromptText,
        blurred_content: blurred,
        auth_overlay: overlay,
    };
})()"#;

/// Reconnaissance probe: the best repeating-content selector's sample text
/// and item count, plus a guess at pagination strategy. Separate from
/// [`STRUCTURAL_SIGNALS`] because reconnaissance also wants a text sample and
/// an approximate item count, which the hostility/complexity scan never needs.
pub const SECTION_CANDIDATE: &str = r#"(() => {
    const containers = Array.from(document.querySelectorAll('body *'))
        .filter(el => el.children.length >= 4);
    let best = null;
    let bestCount = 0;
    for (const container of containers) {
        const classCounts = new Map();
        for (const child of container.children) {
            const cls = child.className && typeof child.className === 'string' ? child.className.trim().split(/\s+/)[0] : null;
            if (!cls) continue;
            classCounts.set(cls, (classCounts.get(cls) || []).concat(child));
        }
        for (const [cls, children] of classCounts) {
            if (children.length > bestCount && children.length >= 4) {
                bestCount = children.length;
                best = { selector: `.${cls}`, count: children.length, sample: children[0].innerText.slice(0, 200) };
            }
        }
    }
    return best || { selector: null, count: 0, sample: null };
})()"#;

pub const PAGINATION_SIGNAL: &str = r#"(() => {
    const bodyText = document.body ? document.body.innerText.toLowerCase() : '';
    const nextEl = document.querySelector(
        'a[rel="next"], a[aria-label="Next"], button[aria-label="Next"], .pagination a.next, .pagination-next'
    );
    let nextSelector = null;
    if (nextEl) {
        nextSelector = nextEl.id ? `#${nextEl.id}` : (nextEl.className ? `.${nextEl.className.trim().split(/\s+/)[0]}` : 'a[rel="next"]');
    } else if (/\bnext\b/.test(bodyText) && document.querySelector('a,button')) {
        nextSelector = null;
    }
    const urlParamDetected = /[?&](page|p|offset)=\d+/.test(location.href);
    const infiniteScrollDetected = !!document.querySelector('[data-infinite-scroll], [class*="infinite-scroll"]');
    return {
        next_button_selector: nextSelector,
        url_param_detected: urlParamDetected,
        infinite_scroll_detected: infiniteScrollDetected,
    };
})()"#;
